//! regionslice - extract a reference-delimited region from an alignment
//!
//! ## Usage
//!
//! ```bash
//! regionslice aligned_sequences.fasta reference_spike.fasta spike_regions.fasta
//! regionslice --aligner /opt/mafft/bin/mafft --temp-dir temp aln.fa ref.fa out.fa
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use regionslice::pipeline::{extract_region, ExtractOptions};
use regionslice::realign::Mafft;

/// Extract the region covered by a reference sequence from an alignment.
///
/// The reference is added to the alignment, everything is realigned with
/// MAFFT, and each sequence is cut to the columns between the first and
/// last non-gap residue of the reference.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input alignment (FASTA format)
    alignment_file: PathBuf,

    /// Reference sequence delimiting the region (FASTA, one record)
    reference_file: PathBuf,

    /// Output file for the extracted regions (FASTA format)
    output_file: PathBuf,

    /// Aligner executable
    #[arg(long = "aligner", default_value = "mafft")]
    aligner: String,

    /// Argument passed to the aligner before the input file (repeatable; default: --auto)
    #[arg(long = "aligner-arg", allow_hyphen_values = true)]
    aligner_args: Vec<String>,

    /// Keep working files in this directory instead of a temporary one
    #[arg(long = "temp-dir")]
    temp_dir: Option<PathBuf>,

    /// Gap symbol used in the alignment
    #[arg(long = "gap", default_value = "-")]
    gap: char,

    /// Wrap output sequences at this many columns (0 = no wrapping)
    #[arg(long = "line-width", default_value = "0")]
    line_width: usize,

    /// Verbosity (1=error, 2=warning, 3=info, 4=debug, 5+=trace)
    #[arg(long = "verbosity", default_value = "3")]
    verbosity: u8,
}

/// Parses arguments; help and version exit 0, any usage error exits 1.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            // Printing only fails if the terminal is gone
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

fn init_logger(verbosity: u8) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logger(args.verbosity);

    if !args.gap.is_ascii() {
        anyhow::bail!("Gap symbol must be an ASCII character (got '{}')", args.gap);
    }

    let mut mafft = Mafft::new(&args.aligner);
    if !args.aligner_args.is_empty() {
        mafft = mafft.with_args(&args.aligner_args);
    }

    let options = ExtractOptions {
        gap: args.gap as u8,
        line_width: args.line_width,
        work_dir: args.temp_dir,
    };

    let summary = extract_region(
        &args.alignment_file,
        &args.reference_file,
        &args.output_file,
        &mafft,
        &options,
    )
    .with_context(|| {
        format!(
            "Failed to extract region from {}",
            args.alignment_file.display()
        )
    })?;

    log::info!(
        "Wrote {} sequences x {} columns (alignment columns {} of {}) to {}",
        summary.sequence_count,
        summary.output_width(),
        summary.span,
        summary.realigned_width,
        args.output_file.display()
    );

    Ok(())
}
