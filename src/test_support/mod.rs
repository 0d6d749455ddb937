//! Shared helpers for unit tests.

pub(crate) mod socket_guard;

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::download::Sleeper;

/// Sleeper that records requested delays instead of waiting.
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[allow(clippy::unwrap_used)]
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    #[allow(clippy::unwrap_used)]
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
