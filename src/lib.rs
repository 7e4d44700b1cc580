//! # regionslice - reference-delimited alignment region extraction
//!
//! Cuts a gene or domain out of a multiple sequence alignment. A reference
//! sequence for the region is added to the alignment, everything is
//! realigned with an external aligner (MAFFT by default), and every record
//! is trimmed to the columns spanned by the reference.
//!
//! ## Architecture
//!
//! - `model`: Sequences and alignments
//! - `formats`: FASTA reading/writing and input validation
//! - `realign`: The `Realigner` trait and the MAFFT subprocess runner
//! - `region`: Locating the reference, inferring its span, slicing
//! - `pipeline`: Orchestration, work directory and atomic output

pub mod formats;
pub mod model;
pub mod pipeline;
pub mod realign;
pub mod region;
