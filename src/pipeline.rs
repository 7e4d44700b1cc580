//! End-to-end extraction: read, combine, realign, cut, write.
//!
//! ```text
//! alignment + reference -> combine -> realign -> locate/infer/slice -> output
//! ```
//!
//! Any failure aborts the run before the output file is touched.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::formats::{self, ParseError};
use crate::model::{Alignment, Sequence};
use crate::realign::{RealignError, Realigner};
use crate::region::{self, RegionError, RegionSpan, GAP};

/// Errors that can abort an extraction.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Realign(#[from] RealignError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("Failed to prepare work directory {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Gap symbol in the realigned records
    pub gap: u8,
    /// Output line width, 0 for unwrapped
    pub line_width: usize,
    /// Keep working files in this directory instead of a scoped temp dir
    pub work_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            gap: GAP,
            line_width: 0,
            work_dir: None,
        }
    }
}

/// What an extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub sequence_count: usize,
    pub realigned_width: usize,
    pub span: RegionSpan,
}

impl ExtractionSummary {
    /// Column count of the written alignment.
    pub fn output_width(&self) -> usize {
        self.span.width()
    }
}

/// Scratch directory for aligner input and output.
///
/// A scoped directory is deleted when the workspace is dropped, whichever
/// way the run ends. A kept directory is left in place with its files.
#[derive(Debug)]
pub enum Workspace {
    Scoped(TempDir),
    Kept(PathBuf),
}

impl Workspace {
    /// Creates a workspace, keeping files in `dir` if one is given.
    pub fn acquire(dir: Option<&Path>) -> PipelineResult<Self> {
        match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|source| PipelineError::Workspace {
                    path: dir.to_path_buf(),
                    source,
                })?;
                Ok(Workspace::Kept(dir.to_path_buf()))
            }
            None => {
                let tmp = tempfile::Builder::new()
                    .prefix("regionslice-")
                    .tempdir()
                    .map_err(|source| PipelineError::Workspace {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                Ok(Workspace::Scoped(tmp))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Workspace::Scoped(tmp) => tmp.path(),
            Workspace::Kept(path) => path.as_path(),
        }
    }
}

/// Appends the reference to the alignment records.
///
/// The result is generally not column-uniform; it is meant as aligner input.
pub fn combine(alignment: &Alignment, reference: &Sequence) -> Alignment {
    let mut records = Vec::with_capacity(alignment.sequence_count() + 1);
    records.extend(alignment.sequences.iter().cloned());
    records.push(reference.clone());
    Alignment::new(records)
}

/// Realigns `alignment` with `reference` and cuts out the reference region.
///
/// Works entirely in memory apart from what the realigner does in the
/// workspace; see [`extract_region`] for the file-based version.
pub fn extract_from_records<R: Realigner + ?Sized>(
    alignment: &Alignment,
    reference: &Sequence,
    realigner: &R,
    workspace: &Workspace,
    gap: u8,
) -> PipelineResult<(region::Region, usize)> {
    let combined = combine(alignment, reference);
    let realigned = realigner.realign(&combined, workspace.path())?;
    let realigned_width = realigned.ensure_uniform().map_err(|source| {
        RealignError::NotAligned {
            path: workspace.path().to_path_buf(),
            source,
        }
    })?;
    log::debug!(
        "Realigned {} sequences to {} columns",
        realigned.sequence_count(),
        realigned_width
    );

    let region = region::extract(&realigned, &reference.id, gap)?;
    Ok((region, realigned_width))
}

/// Runs the whole extraction from files.
pub fn extract_region<R: Realigner + ?Sized>(
    alignment_file: &Path,
    reference_file: &Path,
    output_file: &Path,
    realigner: &R,
    options: &ExtractOptions,
) -> PipelineResult<ExtractionSummary> {
    let alignment = formats::read_alignment(alignment_file)?;
    let reference = formats::read_reference(reference_file)?;
    log::info!(
        "Loaded {} aligned sequences and reference '{}'",
        alignment.sequence_count(),
        reference.id
    );

    let workspace = Workspace::acquire(options.work_dir.as_deref())?;
    log::debug!("Working directory: {}", workspace.path().display());

    let (region, realigned_width) =
        extract_from_records(&alignment, &reference, realigner, &workspace, options.gap)?;

    formats::write_alignment_atomic(output_file, &region.alignment, options.line_width)?;

    if let Workspace::Kept(path) = &workspace {
        log::info!("Working files kept in {}", path.display());
    }

    Ok(ExtractionSummary {
        sequence_count: region.alignment.sequence_count(),
        realigned_width,
        span: region.span,
    })
}
