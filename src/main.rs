//! CLI entry point for imgdl.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod cli;

use cli::Args;

/// Process outcome, mapped onto the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every URL succeeded or was skipped, or there was nothing to do.
    Success,
    /// At least one URL failed, a setup step failed, or the run was interrupted.
    Failure,
    /// The input file or configuration was unusable.
    InputError,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::InputError => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match app::runtime::run_downloader(args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("imgdl: {e:#}");
            ProcessExit::Failure.into()
        }
    }
}
