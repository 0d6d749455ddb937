//! Helpers shared by integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use imgdl_core::{
    ClientSettings, DownloadEngine, Fetcher, HttpClient, NoopObserver, RetryPolicy, Sleeper,
};

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Fetcher with a short timeout and a recording sleeper.
pub fn test_fetcher(retries: u32, backoff: f64) -> (Arc<Fetcher>, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let settings = ClientSettings {
        timeout: Duration::from_secs(5),
        ..ClientSettings::default()
    };
    let client = HttpClient::with_sleeper(
        &settings,
        RetryPolicy::new(retries, backoff),
        sleeper.clone(),
    )
    .unwrap();
    (
        Arc::new(Fetcher::new(client, Arc::new(NoopObserver))),
        sleeper,
    )
}

/// Engine with `workers` workers over [`test_fetcher`].
pub fn test_engine(workers: usize, retries: u32, backoff: f64) -> DownloadEngine {
    let (fetcher, _) = test_fetcher(retries, backoff);
    DownloadEngine::new(workers, fetcher, Arc::new(NoopObserver)).unwrap()
}

/// Regular files in `dir` excluding the manifest, sorted by name.
pub fn downloaded_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .filter(|path| path.file_name().is_some_and(|n| n != ".imgdl-manifest.json"))
        .collect();
    files.sort();
    files
}

/// True if any `.part` file remains in `dir`.
pub fn has_part_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .unwrap()
        .any(|entry| entry.unwrap().path().extension().is_some_and(|e| e == "part"))
}
