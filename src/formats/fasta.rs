//! FASTA reader and writer.
//!
//! The reader handles both single-line and multi-line sequences. The header
//! line is split into an identifier (first word) and an optional
//! description, which the writer puts back unchanged.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGT--ACGTACGT...
//! >another_sequence
//! TGCA--TGCATGCA...
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::{Alignment, Sequence};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Parses a FASTA file and returns its records.
///
/// # Examples
///
/// ```no_run
/// use regionslice::formats::fasta::parse_fasta_file;
///
/// let alignment = parse_fasta_file("sequences.fasta").unwrap();
/// println!("Loaded {} sequences", alignment.sequence_count());
/// ```
pub fn parse_fasta_file<P: AsRef<Path>>(path: P) -> FastaResult<Alignment> {
    let file = File::open(path)?;
    // 1MB buffer, alignments tend to have long lines
    let reader = BufReader::with_capacity(1024 * 1024, file);
    parse_fasta(reader)
}

/// Parses FASTA content from a reader.
pub fn parse_fasta<R: BufRead>(reader: R) -> FastaResult<Alignment> {
    let mut sequences = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_seq: Vec<u8> = Vec::new();
    let mut line_number = 0;

    for line_result in reader.lines() {
        line_number += 1;
        let line = line_result?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, desc)) = current.take() {
                push_record(&mut sequences, id, desc, std::mem::take(&mut current_seq));
            }

            let (id, desc) = split_header(header);
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }

            current = Some((id.to_string(), desc.to_string()));
        } else {
            if current.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }

            // Fast path: most FASTA lines don't have internal whitespace
            if line.bytes().all(|b| !b.is_ascii_whitespace()) {
                current_seq.extend_from_slice(line.as_bytes());
            } else {
                current_seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }
    }

    if let Some((id, desc)) = current {
        push_record(&mut sequences, id, desc, current_seq);
    }

    if sequences.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    Ok(Alignment::new(sequences))
}

/// Parses FASTA content from a string.
///
/// Useful for testing or processing in-memory data.
pub fn parse_fasta_str(content: &str) -> FastaResult<Alignment> {
    parse_fasta(content.as_bytes())
}

// Records with no residues are kept so alignment checks can report them.
fn push_record(sequences: &mut Vec<Sequence>, id: String, desc: String, data: Vec<u8>) {
    if data.is_empty() {
        log::debug!("Record '{}' has no residues", id);
    }
    sequences.push(Sequence::from_bytes(id, data).with_description(desc));
}

fn split_header(header: &str) -> (&str, &str) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, desc)) => (id, desc.trim()),
        None => (header, ""),
    }
}

/// Writes records in FASTA format.
///
/// `line_width` wraps residue lines at that many columns; `0` writes each
/// sequence on a single line.
pub fn write_fasta<W: Write>(
    writer: &mut W,
    alignment: &Alignment,
    line_width: usize,
) -> std::io::Result<()> {
    for seq in &alignment.sequences {
        writeln!(writer, ">{}", seq.header())?;
        let residues = seq.as_bytes();
        if line_width == 0 || residues.is_empty() {
            writer.write_all(residues)?;
            writer.write_all(b"\n")?;
        } else {
            for chunk in residues.chunks(line_width) {
                writer.write_all(chunk)?;
                writer.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Writes records to a FASTA file, replacing any existing file.
pub fn write_fasta_file<P: AsRef<Path>>(
    path: P,
    alignment: &Alignment,
    line_width: usize,
) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_fasta(&mut writer, alignment, line_width)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fasta() {
        let content = ">seq1\nACGT\n>seq2\nTGCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGT");
        assert_eq!(alignment.get(1).unwrap().id, "seq2");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCA");
    }

    #[test]
    fn test_parse_multiline_sequence() {
        let content = ">seq1\nACGT\nTG-A\nAAAA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 1);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTTG-AAAAA");
    }

    #[test]
    fn test_parse_with_description() {
        let content = ">seq1 This is a description\nACGT\n";
        let alignment = parse_fasta_str(content).unwrap();

        let seq = alignment.get(0).unwrap();
        assert_eq!(seq.id, "seq1");
        assert_eq!(seq.description.as_deref(), Some("This is a description"));
    }

    #[test]
    fn test_parse_with_empty_lines() {
        let content = ">seq1\nACGT\n\n>seq2\n\nTGCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGT");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCA");
    }

    #[test]
    fn test_empty_file() {
        let result = parse_fasta_str("");
        assert!(matches!(result, Err(FastaError::EmptyFile)));
    }

    #[test]
    fn test_sequence_without_header() {
        let content = "ACGT\n>seq1\nTGCA\n";
        let result = parse_fasta_str(content);
        assert!(matches!(result, Err(FastaError::SequenceWithoutHeader(1))));
    }

    #[test]
    fn test_record_without_residues_is_kept() {
        let content = ">A\nACGT\n>D\n>B\nTGCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.ids().collect::<Vec<_>>(), vec!["A", "D", "B"]);
        assert!(alignment.get(1).unwrap().is_empty());
        assert!(!alignment.is_valid_alignment);
    }

    #[test]
    fn test_header_only_file() {
        let alignment = parse_fasta_str(">lonely\n").unwrap();
        assert_eq!(alignment.sequence_count(), 1);
        assert!(alignment.get(0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_identifier() {
        let content = ">\nACGT\n";
        let result = parse_fasta_str(content);
        assert!(matches!(result, Err(FastaError::InvalidFormat(_))));
    }

    #[test]
    fn test_gaps_and_case_preserved() {
        let content = ">seq1\nac--gt\n";
        let alignment = parse_fasta_str(content).unwrap();
        assert_eq!(alignment.get(0).unwrap().as_str(), "ac--gt");
    }

    #[test]
    fn test_write_single_line() {
        let alignment = parse_fasta_str(">a desc here\nAC-GT\n>b\nACTGT\n").unwrap();
        let mut out = Vec::new();
        write_fasta(&mut out, &alignment, 0).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">a desc here\nAC-GT\n>b\nACTGT\n"
        );
    }

    #[test]
    fn test_write_wrapped() {
        let alignment = parse_fasta_str(">a\nACGTACGTAC\n").unwrap();
        let mut out = Vec::new();
        write_fasta(&mut out, &alignment, 4).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">a\nACGT\nACGT\nAC\n");
    }

    #[test]
    fn test_written_output_parses_back() {
        let content = ">x first\nAC--GTTA\n>y\nACTTGT-A\n";
        let alignment = parse_fasta_str(content).unwrap();
        let mut out = Vec::new();
        write_fasta(&mut out, &alignment, 3).unwrap();
        let reparsed = parse_fasta(out.as_slice()).unwrap();
        assert_eq!(reparsed.sequences, alignment.sequences);
    }
}
