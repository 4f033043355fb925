//! Per-token result accumulation.

use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::search::{SearchHit, SearchToken, SessionListener, SourceError};

use super::view::FilteredView;
use super::SearchFilter;

struct SinkInner {
    data: Vec<SearchHit>,
    views: Vec<Weak<FilteredView>>,
}

/// Ordered, append-only record of every hit delivered for one token, plus
/// the set of live views observing it.
///
/// All mutation funnels through a single lock; the add callback may be
/// invoked concurrently from many search unit workers under one token.
pub struct ResultSink {
    inner: Mutex<SinkInner>,
}

impl ResultSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SinkInner {
                data: Vec::new(),
                views: Vec::new(),
            }),
        })
    }

    /// Append a batch and forward it to every live view, pruning dead view
    /// references in the same pass.
    pub fn add(&self, batch: Vec<SearchHit>) {
        if batch.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.data.extend(batch.iter().cloned());
        inner.views.retain(|weak| match weak.upgrade() {
            Some(view) => {
                view.add(&batch);
                true
            }
            None => false,
        });
    }

    /// Immutable snapshot of everything accumulated so far.
    pub fn data(&self) -> Vec<SearchHit> {
        self.inner.lock().unwrap().data.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().data.is_empty()
    }

    /// Empty the record and propagate the clear to all live views. Used
    /// when a session restarts under the same token.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.data.clear();
        inner.views.retain(|weak| match weak.upgrade() {
            Some(view) => {
                view.clear();
                true
            }
            None => false,
        });
    }

    /// Create a view over this sink.
    ///
    /// The view is seeded with the sink's full current history before it is
    /// returned, so a late-joining view never misses earlier results. The
    /// sink keeps only a weak reference; dropping the returned `Arc`
    /// unsubscribes the view.
    pub fn view(self: &Arc<Self>, filter: Box<dyn SearchFilter>) -> Arc<FilteredView> {
        let view = FilteredView::new(Arc::downgrade(self), filter);
        let mut inner = self.inner.lock().unwrap();
        view.add(&inner.data);
        // Registration is the only mutation a poll-only reader performs,
        // so dead entries must be reaped here too, not just in add/clear.
        inner.views.retain(|weak| weak.strong_count() > 0);
        inner.views.push(Arc::downgrade(&view));
        view
    }

    fn live_views(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .views
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// `SessionListener` that feeds one token's results into a sink.
///
/// The typical caller wiring: hand this (wrapped in an `Arc`) to a
/// `SearchManager` and read the sink and error log from the other side.
/// Batches bearing a different token are discarded as stale.
pub struct SinkListener {
    token: SearchToken,
    sink: Arc<ResultSink>,
    errors: Mutex<Vec<SourceError>>,
    finished: std::sync::atomic::AtomicBool,
}

impl SinkListener {
    pub fn new(token: SearchToken, sink: Arc<ResultSink>) -> Self {
        Self {
            token,
            sink,
            errors: Mutex::new(Vec::new()),
            finished: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> SearchToken {
        self.token
    }

    pub fn sink(&self) -> &Arc<ResultSink> {
        &self.sink
    }

    pub fn errors(&self) -> Vec<SourceError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// Whether the last unit for this token has drained.
    pub fn is_finished(&self) -> bool {
        self.finished.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl SessionListener for SinkListener {
    fn on_results(&self, token: SearchToken, results: Vec<SearchHit>) {
        if token != self.token {
            debug!(expected = %self.token, got = %token, "Discarding stale batch");
            return;
        }
        self.sink.add(results);
    }

    fn on_error(&self, token: SearchToken, error: SourceError) {
        if token != self.token {
            return;
        }
        self.errors.lock().unwrap().push(error);
    }

    fn on_stopped(&self, token: SearchToken) {
        if token == self.token {
            self.finished
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }
}
