//! File-level reading and writing of sequence records.
//!
//! Records are exchanged as FASTA. On top of the raw parser this module
//! enforces what each input has to be:
//! - the alignment file must hold a column-uniform alignment
//! - the reference file must hold exactly one record
//!
//! Output is written through a temporary file next to the destination and
//! renamed into place, so a failed run never leaves a partial output file.

pub mod fasta;

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Alignment, AlignmentError, Sequence};

/// Errors that can occur while reading or writing sequence files.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error on {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FASTA error in {}: {source}", .path.display())]
    FastaError {
        path: PathBuf,
        #[source]
        source: fasta::FastaError,
    },

    #[error("{} is not a valid alignment: {source}", .path.display())]
    NotAligned {
        path: PathBuf,
        #[source]
        source: AlignmentError,
    },

    #[error("Expected exactly one record in {}, found {count}", .path.display())]
    ReferenceRecordCount { path: PathBuf, count: usize },
}

/// Result type for file operations.
pub type ParseResult<T> = Result<T, ParseError>;

fn parse_records(path: &Path) -> ParseResult<Alignment> {
    fasta::parse_fasta_file(path).map_err(|source| ParseError::FastaError {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an alignment and checks that all records share one length.
pub fn read_alignment<P: AsRef<Path>>(path: P) -> ParseResult<Alignment> {
    let path = path.as_ref();
    let alignment = parse_records(path)?;
    let width = alignment
        .ensure_uniform()
        .map_err(|source| ParseError::NotAligned {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!(
        "Read {} sequences x {} columns from {}",
        alignment.sequence_count(),
        width,
        path.display()
    );
    Ok(alignment)
}

/// Reads a file that must contain exactly one record.
pub fn read_reference<P: AsRef<Path>>(path: P) -> ParseResult<Sequence> {
    let path = path.as_ref();
    let mut records = parse_records(path)?;
    if records.sequence_count() != 1 {
        return Err(ParseError::ReferenceRecordCount {
            path: path.to_path_buf(),
            count: records.sequence_count(),
        });
    }
    let reference = records.sequences.remove(0);
    log::debug!(
        "Read reference '{}' ({} residues) from {}",
        reference.id,
        reference.len(),
        path.display()
    );
    Ok(reference)
}

/// Writes records to `path` atomically.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over `path`. If anything fails the temporary file is removed and
/// `path` is left as it was.
pub fn write_alignment_atomic<P: AsRef<Path>>(
    path: P,
    alignment: &Alignment,
    line_width: usize,
) -> ParseResult<()> {
    let path = path.as_ref();
    let io_err = |source| ParseError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".regionslice-").suffix(".tmp");
    // Request the usual 0o666 so the process umask decides, as for a plain create
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(io_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fasta::write_fasta(&mut writer, alignment, line_width).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }

    // Replacing a file keeps its mode
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(io_err)?;
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
