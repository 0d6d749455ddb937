//! Exit code logic for the imgdl process.
//!
//! Single responsibility: map the run summary to the process exit outcome.

use imgdl_core::RunSummary;

use crate::ProcessExit;

/// Determines the process exit outcome from the run summary.
pub(crate) fn determine_exit_outcome(summary: &RunSummary) -> ProcessExit {
    if summary.is_failure() {
        ProcessExit::Failure
    } else {
        ProcessExit::Success
    }
}
