//! Mock page fetcher for testing.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::fetcher::{FetchError, FetchRequest, PageFetcher};

enum Stub {
    Body(Vec<u8>),
    Error(FetchError),
}

/// Mock implementation of the `PageFetcher` trait.
///
/// Provides controllable behavior for testing:
/// - Stub response bodies or errors per URL
/// - Record every request for assertions
/// - Inject artificial latency
pub struct MockFetcher {
    stubs: Mutex<HashMap<String, Stub>>,
    requests: Mutex<Vec<FetchRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            stubs: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        }
    }

    /// Stub a raw response body for a URL.
    pub fn stub(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.stubs
            .lock()
            .unwrap()
            .insert(url.into(), Stub::Body(body.into()));
    }

    /// Stub a JSON response body for a URL.
    pub fn stub_json<T: Serialize>(&self, url: impl Into<String>, value: &T) {
        let body = serde_json::to_vec(value).expect("stub serialization failed");
        self.stub(url, body);
    }

    /// Stub a fetch failure for a URL.
    pub fn stub_error(&self, url: impl Into<String>, error: FetchError) {
        self.stubs
            .lock()
            .unwrap()
            .insert(url.into(), Stub::Error(error));
    }

    /// Every subsequent fetch sleeps this long before responding.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose URL contains `fragment`.
    pub fn fetch_count_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let stubs = self.stubs.lock().unwrap();
        match stubs.get(&request.url) {
            Some(Stub::Body(body)) => Ok(body.clone()),
            Some(Stub::Error(error)) => Err(error.clone()),
            None => Err(FetchError::Other(format!("no stub for {}", request.url))),
        }
    }
}
