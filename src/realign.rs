//! Realignment through an external multiple sequence aligner.
//!
//! The extractor only needs "records in, column-uniform alignment out", so
//! the aligner sits behind the `Realigner` trait. `Mafft` runs the MAFFT
//! executable; tests and in-process aligners implement the trait directly.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::formats::fasta::{self, FastaError};
use crate::model::{Alignment, AlignmentError};

/// File the combined records are written to inside the work directory.
pub const COMBINED_FILE: &str = "combined_alignment.fasta";
/// File the aligner output is captured to inside the work directory.
pub const REALIGNED_FILE: &str = "realigned_with_reference.fasta";

/// Errors that can occur while realigning.
#[derive(Error, Debug)]
pub enum RealignError {
    #[error("Failed to write aligner input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run aligner '{program}': {source}\n\
             Hint: make sure it is installed and in your PATH, or pass --aligner <path>")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read aligner output {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("Aligner output {} is not a valid alignment: {source}", .path.display())]
    NotAligned {
        path: PathBuf,
        #[source]
        source: AlignmentError,
    },
}

/// Result type for realignment.
pub type RealignResult<T> = Result<T, RealignError>;

/// Produces a column-uniform alignment of the given records.
///
/// Implementations must keep every record identifier. `workdir` is a scratch
/// directory owned by the caller for the duration of the call.
pub trait Realigner {
    fn realign(&self, records: &Alignment, workdir: &Path) -> RealignResult<Alignment>;
}

/// Runs MAFFT (or a compatible program) as a subprocess.
///
/// The program is called as `<program> <args...> <input>` and must write the
/// alignment in FASTA format to stdout.
#[derive(Debug, Clone)]
pub struct Mafft {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for Mafft {
    fn default() -> Self {
        Self {
            program: "mafft".into(),
            args: vec!["--auto".into()],
        }
    }
}

impl Mafft {
    /// Uses the given executable with the default `--auto` strategy.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Replaces the arguments passed before the input file.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Realigner for Mafft {
    fn realign(&self, records: &Alignment, workdir: &Path) -> RealignResult<Alignment> {
        let input = workdir.join(COMBINED_FILE);
        let output = workdir.join(REALIGNED_FILE);

        fasta::write_fasta_file(&input, records, 0).map_err(|source| RealignError::Input {
            path: input.clone(),
            source,
        })?;

        let stdout = File::create(&output).map_err(|source| RealignError::Input {
            path: output.clone(),
            source,
        })?;

        log::info!(
            "Realigning {} sequences with {}",
            records.sequence_count(),
            self.program_name()
        );
        log::debug!("Command: {:?} {:?} {}", self.program, self.args, input.display());

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RealignError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("[{}] {}", self.program_name(), line);
        }

        // A failed run usually leaves empty or truncated output, which the
        // parser below reports.
        if !result.status.success() {
            log::warn!("{} exited with {}", self.program_name(), result.status);
        }

        let alignment = fasta::parse_fasta_file(&output).map_err(|source| RealignError::Output {
            path: output.clone(),
            source,
        })?;
        alignment
            .ensure_uniform()
            .map_err(|source| RealignError::NotAligned {
                path: output.clone(),
                source,
            })?;

        Ok(alignment)
    }
}
