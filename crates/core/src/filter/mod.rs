//! Result aggregation: filtering, keyed grouping, live views.
//!
//! A `ResultSink` is the per-token, append-only record of everything a
//! session delivered. Zero or more `FilteredView`s observe a sink and keep
//! a key-grouped, sorted projection of it, updated incrementally as
//! batches stream in. The grouping policy is a pluggable `SearchFilter`:
//! an accept predicate, a key function and an in-group comparator, which
//! compose so callers can filter and group on several dimensions without
//! the core knowing about any of them.

mod sink;
mod view;

pub use sink::{ResultSink, SinkListener};
pub use view::{FilteredView, SearchGroup, ViewListener};

use std::cmp::Ordering;

use crate::search::SearchHit;

/// A comparable, displayable grouping key.
///
/// The distinguished `Null` key sorts after every real key and compares
/// equal only to itself; it buckets hits a filter cannot classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKey {
    Key { id: String, display: String },
    Null,
}

impl FilterKey {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        FilterKey::Key {
            id: id.into(),
            display: display.into(),
        }
    }

    /// Key whose id doubles as its display string.
    pub fn from_display(display: impl Into<String>) -> Self {
        let display = display.into();
        FilterKey::Key {
            id: display.clone(),
            display,
        }
    }

    pub fn display(&self) -> &str {
        match self {
            FilterKey::Key { display, .. } => display,
            FilterKey::Null => "",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterKey::Null)
    }
}

impl Ord for FilterKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FilterKey::Null, FilterKey::Null) => Ordering::Equal,
            (FilterKey::Null, FilterKey::Key { .. }) => Ordering::Greater,
            (FilterKey::Key { .. }, FilterKey::Null) => Ordering::Less,
            (
                FilterKey::Key { id: a, display: da },
                FilterKey::Key { id: b, display: db },
            ) => a.cmp(b).then_with(|| da.cmp(db)),
        }
    }
}

impl PartialOrd for FilterKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pluggable accept/key/compare policy driving a `FilteredView`.
pub trait SearchFilter: Send + Sync {
    /// Whether the hit enters the view at all.
    fn accept(&self, hit: &SearchHit) -> bool;

    /// The group the hit belongs to.
    fn key(&self, hit: &SearchHit) -> FilterKey;

    /// In-group ordering.
    fn compare(&self, a: &SearchHit, b: &SearchHit) -> Ordering;
}

/// AND-composition of filters.
///
/// Acceptance is the conjunction of all parts; the key concatenates the
/// non-null part keys (a part with a `Null` key contributes no grouping
/// dimension); the comparator chains parts as tie-breaks in order.
pub struct CompositeFilter {
    parts: Vec<Box<dyn SearchFilter>>,
}

impl CompositeFilter {
    pub fn and(parts: Vec<Box<dyn SearchFilter>>) -> Self {
        Self { parts }
    }
}

impl SearchFilter for CompositeFilter {
    fn accept(&self, hit: &SearchHit) -> bool {
        self.parts.iter().all(|p| p.accept(hit))
    }

    fn key(&self, hit: &SearchHit) -> FilterKey {
        let mut ids = Vec::new();
        let mut displays = Vec::new();
        for part in &self.parts {
            if let FilterKey::Key { id, display } = part.key(hit) {
                ids.push(id);
                displays.push(display);
            }
        }
        if ids.is_empty() {
            FilterKey::Null
        } else {
            FilterKey::new(ids.join("|"), displays.join(" / "))
        }
    }

    fn compare(&self, a: &SearchHit, b: &SearchHit) -> Ordering {
        for part in &self.parts {
            let ordering = part.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Groups hits by their source name, best-seeded first within each group.
pub struct SourceGroupFilter;

impl SearchFilter for SourceGroupFilter {
    fn accept(&self, _hit: &SearchHit) -> bool {
        true
    }

    fn key(&self, hit: &SearchHit) -> FilterKey {
        if hit.source.is_empty() {
            FilterKey::Null
        } else {
            FilterKey::from_display(&hit.source)
        }
    }

    fn compare(&self, a: &SearchHit, b: &SearchHit) -> Ordering {
        b.seeders
            .cmp(&a.seeders)
            .then_with(|| a.title.cmp(&b.title))
    }
}

/// Drops hits below a seeder threshold; contributes no grouping dimension.
pub struct MinSeedersFilter {
    min: u32,
}

impl MinSeedersFilter {
    pub fn new(min: u32) -> Self {
        Self { min }
    }
}

impl SearchFilter for MinSeedersFilter {
    fn accept(&self, hit: &SearchHit) -> bool {
        hit.seeders >= self.min
    }

    fn key(&self, _hit: &SearchHit) -> FilterKey {
        FilterKey::Null
    }

    fn compare(&self, a: &SearchHit, b: &SearchHit) -> Ordering {
        b.seeders.cmp(&a.seeders)
    }
}
