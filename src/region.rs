//! Reference-delimited region extraction.
//!
//! Given an alignment that contains a reference record, the region is the
//! inclusive column range from the reference's first to its last non-gap
//! residue. Every record is cut to that same column range, so the result is
//! still an alignment. Gaps inside the range are kept, including columns
//! where the reference itself has a gap.
//!
//! ```text
//! ref   --ACGT---      span = (2, 5)
//! seq1  TTACGTAAA  ->  ACGT
//! ```

use std::fmt;

use thiserror::Error;

use crate::model::Alignment;

/// The default gap symbol.
pub const GAP: u8 = b'-';

/// Errors raised while locating or cutting the region.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegionError {
    #[error("Reference sequence '{id}' not found in the alignment")]
    ReferenceNotFound { id: String },

    #[error("No non-gap positions found in the reference sequence")]
    EmptyReference,

    #[error("Region {span} does not fit an alignment of {width} columns")]
    SpanOutOfBounds { span: RegionSpan, width: usize },
}

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Inclusive, zero-based column range covered by the reference residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub start: usize,
    pub end: usize,
}

impl RegionSpan {
    /// Creates a span. Returns `None` if `start > end`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for RegionSpan {
    /// Shown 1-based, the way alignment columns are usually reported.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start + 1, self.end + 1)
    }
}

/// Finds the first record whose identifier equals `id`.
///
/// If the identifier occurs more than once the earliest record wins and a
/// warning is logged.
pub fn locate_reference(alignment: &Alignment, id: &str) -> RegionResult<usize> {
    let mut matches = alignment
        .ids()
        .enumerate()
        .filter(|(_, seq_id)| *seq_id == id)
        .map(|(i, _)| i);

    let index = matches.next().ok_or_else(|| RegionError::ReferenceNotFound {
        id: id.to_string(),
    })?;

    let duplicates = matches.count();
    if duplicates > 0 {
        log::warn!(
            "Reference '{}' occurs {} times in the realigned records; using the first (row {})",
            id,
            duplicates + 1,
            index + 1
        );
    }

    Ok(index)
}

/// Computes the tightest span covering every non-gap residue.
pub fn infer_span(residues: &[u8], gap: u8) -> RegionResult<RegionSpan> {
    let mut start = None;
    let mut end = 0;

    for (i, &res) in residues.iter().enumerate() {
        if res != gap {
            if start.is_none() {
                start = Some(i);
            }
            end = i;
        }
    }

    match start {
        Some(start) => Ok(RegionSpan { start, end }),
        None => Err(RegionError::EmptyReference),
    }
}

/// Cuts every record to the columns of `span`.
///
/// Record order, identifiers and descriptions are preserved. The input is
/// not modified.
pub fn slice_alignment(alignment: &Alignment, span: RegionSpan) -> RegionResult<Alignment> {
    let sequences = alignment
        .sequences
        .iter()
        .map(|seq| {
            seq.columns(span.start..=span.end)
                .ok_or(RegionError::SpanOutOfBounds {
                    span,
                    width: seq.len(),
                })
        })
        .collect::<RegionResult<Vec<_>>>()?;

    Ok(Alignment::new(sequences))
}

/// The extracted region together with the span it was cut from.
#[derive(Debug, Clone)]
pub struct Region {
    pub span: RegionSpan,
    pub reference_index: usize,
    pub alignment: Alignment,
}

/// Locates the reference, infers its span and slices the alignment.
pub fn extract(alignment: &Alignment, reference_id: &str, gap: u8) -> RegionResult<Region> {
    let reference_index = locate_reference(alignment, reference_id)?;
    let reference = &alignment.sequences[reference_index];
    let span = infer_span(reference.as_bytes(), gap)?;
    log::debug!(
        "Reference '{}' spans columns {} ({} columns)",
        reference_id,
        span,
        span.width()
    );

    Ok(Region {
        span,
        reference_index,
        alignment: slice_alignment(alignment, span)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sequence;

    fn aln(records: &[(&str, &str)]) -> Alignment {
        Alignment::new(
            records
                .iter()
                .map(|(id, data)| Sequence::new(*id, *data))
                .collect(),
        )
    }

    fn residues(alignment: &Alignment) -> Vec<String> {
        alignment
            .sequences
            .iter()
            .map(|s| s.as_str().into_owned())
            .collect()
    }

    #[test]
    fn test_infer_span_example() {
        let span = infer_span(b"--ACGT---", GAP).unwrap();
        assert_eq!(span, RegionSpan { start: 2, end: 5 });
        assert_eq!(span.width(), 4);
    }

    #[test]
    fn test_infer_span_keeps_internal_gaps() {
        let span = infer_span(b"-AC--GT-", GAP).unwrap();
        assert_eq!(span, RegionSpan { start: 1, end: 6 });
    }

    #[test]
    fn test_infer_span_single_residue() {
        let span = infer_span(b"----A--", GAP).unwrap();
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 4);
        assert_eq!(span.width(), 1);
    }

    #[test]
    fn test_infer_span_no_gaps() {
        let span = infer_span(b"ACGT", GAP).unwrap();
        assert_eq!(span, RegionSpan { start: 0, end: 3 });
    }

    #[test]
    fn test_infer_span_all_gaps() {
        assert_eq!(infer_span(b"-----", GAP), Err(RegionError::EmptyReference));
        assert_eq!(infer_span(b"", GAP), Err(RegionError::EmptyReference));
    }

    #[test]
    fn test_infer_span_custom_gap() {
        let span = infer_span(b"..AC.", b'.').unwrap();
        assert_eq!(span, RegionSpan { start: 2, end: 3 });
        // '-' is an ordinary residue when another gap symbol is in use
        let span = infer_span(b"-.A", b'.').unwrap();
        assert_eq!(span, RegionSpan { start: 0, end: 2 });
    }

    #[test]
    fn test_infer_span_bounds_are_tight() {
        let cases: &[&[u8]] = &[b"A", b"-A", b"A-", b"--A-C--G", b"AC-GT", b"-----T"];
        for &case in cases {
            let span = infer_span(case, GAP).unwrap();
            assert_ne!(case[span.start], GAP);
            assert_ne!(case[span.end], GAP);
            assert!(case[..span.start].iter().all(|&b| b == GAP));
            assert!(case[span.end + 1..].iter().all(|&b| b == GAP));
        }
    }

    #[test]
    fn test_locate_reference() {
        let alignment = aln(&[("a", "AC"), ("ref", "A-"), ("b", "GT")]);
        assert_eq!(locate_reference(&alignment, "ref"), Ok(1));
        assert_eq!(locate_reference(&alignment, "a"), Ok(0));
    }

    #[test]
    fn test_locate_reference_first_match_wins() {
        let alignment = aln(&[("a", "AC"), ("ref", "A-"), ("ref", "-C")]);
        assert_eq!(locate_reference(&alignment, "ref"), Ok(1));
    }

    #[test]
    fn test_locate_reference_not_found() {
        let alignment = aln(&[("a", "AC"), ("b", "GT")]);
        assert_eq!(
            locate_reference(&alignment, "ref"),
            Err(RegionError::ReferenceNotFound {
                id: "ref".to_string()
            })
        );
    }

    #[test]
    fn test_locate_reference_is_exact_match() {
        let alignment = aln(&[("ref_1", "AC"), ("REF", "GT")]);
        assert!(locate_reference(&alignment, "ref").is_err());
    }

    #[test]
    fn test_slice_alignment() {
        let alignment = aln(&[("seq1", "TTACGTAAA"), ("ref", "--ACGT---"), ("seq2", "T-A-GTA-A")]);
        let span = RegionSpan::new(2, 5).unwrap();
        let sliced = slice_alignment(&alignment, span).unwrap();

        assert_eq!(sliced.ids().collect::<Vec<_>>(), vec!["seq1", "ref", "seq2"]);
        assert_eq!(residues(&sliced), vec!["ACGT", "ACGT", "A-GT"]);
        assert!(sliced.is_valid_alignment);
        assert_eq!(sliced.alignment_length(), 4);
        // Input unchanged
        assert_eq!(alignment.get(0).unwrap().as_str(), "TTACGTAAA");
    }

    #[test]
    fn test_slice_widths_are_uniform() {
        let alignment = aln(&[("a", "ACGTACGT"), ("b", "--GT-CG-"), ("c", "A------T")]);
        for start in 0..8 {
            for end in start..8 {
                let span = RegionSpan::new(start, end).unwrap();
                let sliced = slice_alignment(&alignment, span).unwrap();
                assert_eq!(sliced.sequence_count(), 3);
                assert!(sliced
                    .sequences
                    .iter()
                    .all(|s| s.len() == end - start + 1));
            }
        }
    }

    #[test]
    fn test_full_width_slice_is_identity() {
        let alignment = aln(&[("a", "AC-T"), ("b", "-CGT")]);
        let span = RegionSpan::new(0, alignment.alignment_length() - 1).unwrap();
        let sliced = slice_alignment(&alignment, span).unwrap();
        assert_eq!(sliced.sequences, alignment.sequences);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let alignment = aln(&[("a", "ACGT")]);
        let span = RegionSpan::new(2, 4).unwrap();
        assert_eq!(
            slice_alignment(&alignment, span).unwrap_err(),
            RegionError::SpanOutOfBounds { span, width: 4 }
        );
    }

    #[test]
    fn test_span_constructor_and_display() {
        assert!(RegionSpan::new(3, 2).is_none());
        let span = RegionSpan::new(0, 9).unwrap();
        assert_eq!(span.to_string(), "1..10");
    }

    #[test]
    fn test_extract() {
        let alignment = aln(&[
            ("seq1", "TTACGTAAA"),
            ("seq2", "TTAC-TAAG"),
            ("ref", "--ACGT---"),
        ]);
        let region = extract(&alignment, "ref", GAP).unwrap();
        assert_eq!(region.span, RegionSpan { start: 2, end: 5 });
        assert_eq!(region.reference_index, 2);
        assert_eq!(residues(&region.alignment), vec!["ACGT", "AC-T", "ACGT"]);
    }

    #[test]
    fn test_extract_empty_reference() {
        let alignment = aln(&[("seq1", "ACGT"), ("ref", "----")]);
        assert_eq!(
            extract(&alignment, "ref", GAP).unwrap_err(),
            RegionError::EmptyReference
        );
    }
}
