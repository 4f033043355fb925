//! Live, incrementally updated projections of a result sink.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

use crate::search::SearchHit;

use super::sink::ResultSink;
use super::{FilterKey, SearchFilter};

/// Observer of one view's incremental updates.
///
/// Callbacks run while the owning sink's lock is held; implementations
/// must not call back into the sink or the view.
pub trait ViewListener: Send + Sync {
    /// Newly accepted hits, one call per added batch.
    fn on_added(&self, added: &[SearchHit]);

    /// The view was cleared (session restart or filter change).
    fn on_cleared(&self);
}

/// The ordered members of one filter key.
#[derive(Debug, Clone)]
pub struct SearchGroup {
    key: FilterKey,
    hits: Vec<SearchHit>,
}

impl SearchGroup {
    fn new(key: FilterKey) -> Self {
        Self {
            key,
            hits: Vec::new(),
        }
    }

    pub fn key(&self) -> &FilterKey {
        &self.key
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

struct ViewInner {
    filter: Box<dyn SearchFilter>,
    groups: BTreeMap<FilterKey, SearchGroup>,
    listener: Option<Box<dyn ViewListener>>,
}

impl ViewInner {
    /// Returns the subset of `batch` that passed the filter.
    fn insert(&mut self, batch: &[SearchHit]) -> Vec<SearchHit> {
        let mut accepted = Vec::new();
        for hit in batch {
            if !self.filter.accept(hit) {
                continue;
            }
            let key = self.filter.key(hit);
            let group = self
                .groups
                .entry(key.clone())
                .or_insert_with(|| SearchGroup::new(key));
            let at = group
                .hits
                .binary_search_by(|existing| self.filter.compare(existing, hit))
                .unwrap_or_else(|i| i);
            group.hits.insert(at, hit.clone());
            accepted.push(hit.clone());
        }
        accepted
    }
}

/// A key-grouped, sorted, live projection of a `ResultSink`.
///
/// Views are created via `ResultSink::view` and held by the sink behind a
/// weak reference: dropping every `Arc<FilteredView>` unsubscribes it, the
/// sink prunes the dead entry on its next mutation.
pub struct FilteredView {
    sink: Weak<ResultSink>,
    inner: Mutex<ViewInner>,
}

impl FilteredView {
    pub(crate) fn new(sink: Weak<ResultSink>, filter: Box<dyn SearchFilter>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            inner: Mutex::new(ViewInner {
                filter,
                groups: BTreeMap::new(),
                listener: None,
            }),
        })
    }

    /// Attach the update observer. Replaces any previous listener.
    pub fn set_listener(&self, listener: Box<dyn ViewListener>) {
        self.inner.lock().unwrap().listener = Some(listener);
    }

    /// Feed a batch through the filter. Notifies the listener once with
    /// only the newly accepted subset, never the accumulated history.
    pub(crate) fn add(&self, batch: &[SearchHit]) {
        let mut inner = self.inner.lock().unwrap();
        let accepted = inner.insert(batch);
        if accepted.is_empty() {
            return;
        }
        if let Some(listener) = &inner.listener {
            listener.on_added(&accepted);
        }
    }

    pub(crate) fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.groups.clear();
        if let Some(listener) = &inner.listener {
            listener.on_cleared();
        }
    }

    /// Discard the grouping and rebuild it from the sink's current
    /// snapshot. Used when the filter policy changed at runtime.
    pub fn refresh(&self) {
        let Some(sink) = self.sink.upgrade() else {
            warn!("refresh() on a view whose sink is gone");
            return;
        };
        // Snapshot first: taking the sink lock while holding the view lock
        // would invert the sink -> view lock order used by add().
        let snapshot = sink.data();
        let mut inner = self.inner.lock().unwrap();
        inner.groups.clear();
        if let Some(listener) = &inner.listener {
            listener.on_cleared();
        }
        let accepted = inner.insert(&snapshot);
        if !accepted.is_empty() {
            if let Some(listener) = &inner.listener {
                listener.on_added(&accepted);
            }
        }
    }

    /// Swap the filter policy and rebuild.
    pub fn set_filter(&self, filter: Box<dyn SearchFilter>) {
        self.inner.lock().unwrap().filter = filter;
        self.refresh();
    }

    /// Snapshot of the groups, sorted by key (null key last).
    pub fn groups(&self) -> Vec<SearchGroup> {
        self.inner.lock().unwrap().groups.values().cloned().collect()
    }

    /// Total hits across all groups.
    pub fn total_hits(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .groups
            .values()
            .map(|g| g.hits.len())
            .sum()
    }
}
