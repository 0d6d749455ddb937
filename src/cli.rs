//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use imgdl_core::DEFAULT_WORKERS;
use imgdl_core::download::{DEFAULT_BACKOFF_FACTOR, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS};

/// Download every URL listed in a text file.
///
/// One URL per line; `#` starts a comment line and anything after `,` or `;`
/// is ignored. Files already present in the output directory are skipped.
#[derive(Parser, Debug, Clone)]
#[command(name = "imgdl")]
#[command(author, version, about)]
pub struct Args {
    /// Text file with one URL per line
    #[arg(short, long, default_value = "links.txt")]
    pub input: PathBuf,

    /// Directory to save files into (created if missing)
    #[arg(short, long, default_value = "downloads")]
    pub output: PathBuf,

    /// Log file path [default: <OUTPUT>/download.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Per-request timeout in seconds (connect and each read)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, allow_negative_numbers = true)]
    pub timeout: f64,

    /// Retries after the first attempt for transient failures
    #[arg(long, default_value_t = i64::from(DEFAULT_RETRIES), allow_negative_numbers = true)]
    pub retries: i64,

    /// Backoff factor in seconds (delay before retry n is backoff * 2^(n-1))
    #[arg(long, default_value_t = DEFAULT_BACKOFF_FACTOR, allow_negative_numbers = true)]
    pub backoff: f64,

    /// Parallel downloads (1-100; 1 keeps input order)
    #[arg(
        short,
        long,
        default_value_t = i64::try_from(DEFAULT_WORKERS).unwrap_or(1),
        allow_negative_numbers = true
    )]
    pub workers: i64,

    /// Encoding of the input file (utf-8, latin-1, ascii)
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
