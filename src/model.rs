//! Data model for sequences and alignments.
//!
//! This module contains the record types shared by the readers, the
//! realigner and the region extractor:
//! - `Sequence`: one identifier plus its residues
//! - `Alignment`: an ordered set of sequences, with a uniformity check
//!
//! Residues are stored as bytes and indexed by column, so every operation
//! here works on alignment columns rather than characters.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Errors raised when a record set is used as an alignment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Alignment contains no sequences")]
    Empty,

    #[error("Sequences have different lengths (min: {min}, max: {max}). Not a valid alignment.")]
    RaggedAlignment { min: usize, max: usize },
}

/// Represents a single sequence with its identifier and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier (first word of the FASTA header, without '>')
    pub id: String,
    /// Remainder of the header line after the identifier, if any
    pub description: Option<String>,
    /// The residues, gaps included
    data: Vec<u8>,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::from_bytes(id, data.into().into_bytes())
    }

    /// Creates a sequence from raw residue bytes.
    pub fn from_bytes(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            description: None,
            data,
        }
    }

    /// Attaches a header description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Returns the length of the sequence in columns.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the residues as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the residues as text. Non UTF-8 bytes are replaced.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Returns the full FASTA header (without '>').
    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {}", self.id, desc),
            None => self.id.clone(),
        }
    }

    /// Copies the given inclusive column range into a new sequence with the
    /// same identifier and description.
    ///
    /// Returns `None` if the range runs past the end of the sequence.
    pub fn columns(&self, range: RangeInclusive<usize>) -> Option<Sequence> {
        let data = self.data.get(range)?.to_vec();
        Some(Sequence {
            id: self.id.clone(),
            description: self.description.clone(),
            data,
        })
    }
}

/// Represents an ordered collection of sequences.
///
/// Record sets that are not (yet) aligned are allowed; `is_valid_alignment`
/// tells whether all sequences share one length.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// All sequences, in input order
    pub sequences: Vec<Sequence>,
    /// The expected length of all sequences (if aligned)
    alignment_length: Option<usize>,
    /// Whether all sequences have the same length
    pub is_valid_alignment: bool,
    /// Warning message if sequences have different lengths
    pub warning: Option<String>,
}

impl Alignment {
    /// Creates a new alignment from a vector of sequences.
    pub fn new(sequences: Vec<Sequence>) -> Self {
        let (is_valid, alignment_length, warning) = Self::validate_alignment(&sequences);
        Self {
            sequences,
            alignment_length,
            is_valid_alignment: is_valid,
            warning,
        }
    }

    /// Validates that all sequences have the same length.
    fn validate_alignment(sequences: &[Sequence]) -> (bool, Option<usize>, Option<String>) {
        if sequences.is_empty() {
            return (true, None, None);
        }

        match Self::length_range(sequences) {
            (min, max) if min == max => (true, Some(min), None),
            (min, max) => {
                let warning = AlignmentError::RaggedAlignment { min, max }.to_string();
                (false, Some(max), Some(format!("Warning: {}", warning)))
            }
        }
    }

    fn length_range(sequences: &[Sequence]) -> (usize, usize) {
        let min_len = sequences.iter().map(Sequence::len).min().unwrap_or(0);
        let max_len = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        (min_len, max_len)
    }

    /// Checks that this record set is a non-empty, column-uniform alignment
    /// and returns its column count.
    pub fn ensure_uniform(&self) -> Result<usize, AlignmentError> {
        if self.sequences.is_empty() {
            return Err(AlignmentError::Empty);
        }
        if !self.is_valid_alignment {
            let (min, max) = Self::length_range(&self.sequences);
            return Err(AlignmentError::RaggedAlignment { min, max });
        }
        Ok(self.alignment_length())
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the alignment length (max sequence length).
    pub fn alignment_length(&self) -> usize {
        self.alignment_length.unwrap_or(0)
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Iterates over the sequence identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.id.as_str())
    }

    /// Returns true if the alignment is empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
