//! Session listener that records everything for assertions.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::search::{SearchHit, SearchToken, SessionListener, SourceError};

/// Mock implementation of the `SessionListener` trait.
#[derive(Default)]
pub struct RecordingListener {
    batches: Mutex<Vec<(SearchToken, Vec<SearchHit>)>>,
    errors: Mutex<Vec<(SearchToken, SourceError)>>,
    stopped: Mutex<Vec<SearchToken>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches in arrival order.
    pub fn batches(&self) -> Vec<(SearchToken, Vec<SearchHit>)> {
        self.batches.lock().unwrap().clone()
    }

    /// Every hit delivered under `token`, flattened across batches.
    pub fn hits(&self, token: SearchToken) -> Vec<SearchHit> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == token)
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }

    pub fn errors(&self) -> Vec<(SearchToken, SourceError)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn error_count(&self, token: SearchToken) -> usize {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == token)
            .count()
    }

    pub fn stopped_count(&self, token: SearchToken) -> usize {
        self.stopped
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == token)
            .count()
    }

    /// Poll until `on_stopped(token)` arrives or `timeout` elapses.
    pub async fn wait_for_stopped(&self, token: SearchToken, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.stopped_count(token) > 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

impl SessionListener for RecordingListener {
    fn on_results(&self, token: SearchToken, results: Vec<SearchHit>) {
        self.batches.lock().unwrap().push((token, results));
    }

    fn on_error(&self, token: SearchToken, error: SourceError) {
        self.errors.lock().unwrap().push((token, error));
    }

    fn on_stopped(&self, token: SearchToken) {
        self.stopped.lock().unwrap().push(token);
    }
}
