//! Run orchestration: config, logging, parse, download, report.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use imgdl_core::{
    DownloadEngine, DownloadObserver, Fetcher, HttpClient, LinkParser, TracingObserver, summarize,
};
use tracing::{debug, error, info, warn};

use crate::ProcessExit;
use crate::app::{config_manager, exit_handler, progress_manager::ProgressObserver, terminal};
use crate::cli::Args;

pub(crate) async fn run_downloader(args: Args) -> Result<ProcessExit> {
    let config = match config_manager::resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("imgdl: {e}");
            return Ok(ProcessExit::InputError);
        }
    };

    let dumb_terminal = terminal::is_dumb_terminal();
    let no_color =
        terminal::should_disable_color(terminal::no_color_env_requested(), dumb_terminal);
    terminal::init_tracing(
        terminal::default_log_level(config.verbose, config.quiet),
        no_color,
        &config.log_file,
    )?;

    for adjustment in &config.adjustments {
        warn!("{adjustment}");
    }
    debug!(?config, "configuration resolved");
    info!(
        input = %config.input.display(),
        output = %config.output_dir.display(),
        workers = config.workers,
        "imgdl starting"
    );

    let links = match LinkParser::new().parse_file(&config.input, config.encoding) {
        Ok(links) => links,
        Err(e) => {
            error!(error = %e, "cannot load input");
            return Ok(ProcessExit::InputError);
        }
    };
    info!("{links}");

    if links.is_empty() {
        warn!(input = %config.input.display(), "no URLs to download");
        return Ok(ProcessExit::Success);
    }

    let stderr_is_terminal = io::stderr().is_terminal();
    let progress = terminal::should_use_progress(stderr_is_terminal, config.quiet, dumb_terminal)
        .then(|| Arc::new(ProgressObserver::new(links.len())));
    let observer: Arc<dyn DownloadObserver> = match &progress {
        Some(progress) => Arc::clone(progress) as Arc<dyn DownloadObserver>,
        None => Arc::new(TracingObserver),
    };

    // Client and engine are dropped at the end of this block.
    let results = {
        let client = HttpClient::new(&config.client_settings(), config.retry_policy())
            .context("failed to build HTTP client")?;
        let fetcher = Arc::new(Fetcher::new(client, Arc::clone(&observer)));
        let engine = DownloadEngine::new(config.workers, fetcher, observer)?;

        tokio::select! {
            results = engine.run(links.urls(), &config.output_dir) => results?,
            _ = tokio::signal::ctrl_c() => {
                if let Some(progress) = &progress {
                    progress.finish();
                }
                warn!("interrupted, in-flight downloads discarded");
                return Ok(ProcessExit::Failure);
            }
        }
    };

    if let Some(progress) = &progress {
        progress.finish();
    }

    let summary = summarize(&results);
    info!("Done: {summary}");
    Ok(exit_handler::determine_exit_outcome(&summary))
}
