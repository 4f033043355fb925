use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use dragnet_core::{
    Config, PageFetcher, SearchHit, SearchManager, SearchToken, SessionListener, SinkListener,
    SourceEntry, SourceError, SourceExtractor,
};

/// One configured source: its config entry plus the extractor built from it.
pub struct ConfiguredSource {
    pub entry: SourceEntry,
    pub extractor: Arc<dyn SourceExtractor>,
}

/// One live or completed search session.
pub struct SessionEntry {
    pub keywords: String,
    pub sources: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub listener: Arc<SinkListener>,
}

/// Token-keyed registry of sessions, doubling as the manager's listener.
///
/// The manager invokes the `SessionListener` callbacks from unit workers;
/// the registry routes each one to the session's own `SinkListener`.
/// Callbacks for tokens with no registered session are dropped.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: SearchToken, entry: Arc<SessionEntry>) {
        self.sessions.lock().unwrap().insert(token.value(), entry);
    }

    pub fn get(&self, token: SearchToken) -> Option<Arc<SessionEntry>> {
        self.sessions.lock().unwrap().get(&token.value()).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl SessionListener for SessionRegistry {
    fn on_results(&self, token: SearchToken, results: Vec<SearchHit>) {
        if let Some(entry) = self.get(token) {
            entry.listener.on_results(token, results);
        } else {
            debug!(token = %token, "Dropping results for unknown session");
        }
    }

    fn on_error(&self, token: SearchToken, error: SourceError) {
        if let Some(entry) = self.get(token) {
            entry.listener.on_error(token, error);
        }
    }

    fn on_stopped(&self, token: SearchToken) {
        if let Some(entry) = self.get(token) {
            entry.listener.on_stopped(token);
        }
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    manager: SearchManager,
    fetcher: Arc<dyn PageFetcher>,
    sources: Vec<ConfiguredSource>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        config: Config,
        manager: SearchManager,
        fetcher: Arc<dyn PageFetcher>,
        sources: Vec<ConfiguredSource>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            config,
            manager,
            fetcher,
            sources,
            sessions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &SearchManager {
        &self.manager
    }

    pub fn fetcher(&self) -> Arc<dyn PageFetcher> {
        Arc::clone(&self.fetcher)
    }

    pub fn sources(&self) -> &[ConfiguredSource] {
        &self.sources
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
