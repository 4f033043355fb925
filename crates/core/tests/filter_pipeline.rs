//! Sink/view aggregation pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dragnet_core::testing::fixtures;
use dragnet_core::{
    CompositeFilter, FilterKey, MinSeedersFilter, ResultSink, SearchHit, SourceGroupFilter,
    ViewListener,
};

/// Records every notification a view emits.
struct CollectingListener {
    added: Arc<Mutex<Vec<Vec<SearchHit>>>>,
    cleared: Arc<AtomicUsize>,
}

impl CollectingListener {
    fn new() -> (Box<Self>, Arc<Mutex<Vec<Vec<SearchHit>>>>, Arc<AtomicUsize>) {
        let added = Arc::new(Mutex::new(Vec::new()));
        let cleared = Arc::new(AtomicUsize::new(0));
        let listener = Box::new(Self {
            added: Arc::clone(&added),
            cleared: Arc::clone(&cleared),
        });
        (listener, added, cleared)
    }
}

impl ViewListener for CollectingListener {
    fn on_added(&self, added: &[SearchHit]) {
        self.added.lock().unwrap().push(added.to_vec());
    }

    fn on_cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_late_view_sees_full_history() {
    let sink = ResultSink::new();
    sink.add(vec![fixtures::hit("a", "x", 10)]);
    sink.add(vec![fixtures::hit("b", "y", 3), fixtures::hit("c", "x", 7)]);

    // The view joins after three hits already arrived.
    let view = sink.view(Box::new(SourceGroupFilter));
    assert_eq!(view.total_hits(), 3);

    let groups = view.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key().display(), "x");
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1].key().display(), "y");
}

#[test]
fn test_incremental_notification_carries_only_new_hits() {
    let sink = ResultSink::new();
    sink.add(vec![fixtures::hit("history", "x", 10)]);

    let view = sink.view(Box::new(MinSeedersFilter::new(5)));
    let (listener, added, _) = CollectingListener::new();
    view.set_listener(listener);

    sink.add(vec![
        fixtures::hit("pass-1", "x", 9),
        fixtures::hit("drop", "x", 1),
        fixtures::hit("pass-2", "y", 6),
    ]);

    // One call for the batch, with the accepted subset only; the seeded
    // history is not replayed.
    let added = added.lock().unwrap();
    assert_eq!(added.len(), 1);
    let titles: Vec<&str> = added[0].iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["pass-1", "pass-2"]);
}

#[test]
fn test_fully_rejected_batch_emits_no_notification() {
    let sink = ResultSink::new();
    let view = sink.view(Box::new(MinSeedersFilter::new(100)));
    let (listener, added, _) = CollectingListener::new();
    view.set_listener(listener);

    sink.add(vec![fixtures::hit("weak", "x", 1)]);

    assert!(added.lock().unwrap().is_empty());
    assert_eq!(view.total_hits(), 0);
    // The sink itself still records everything.
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_grouping_is_arrival_order_independent() {
    let hits = vec![
        fixtures::hit("a", "x", 10),
        fixtures::hit("b", "y", 3),
        fixtures::hit("c", "x", 7),
        fixtures::hit("d", "z", 1),
        fixtures::hit("e", "y", 8),
    ];

    let forward = ResultSink::new();
    for hit in &hits {
        forward.add(vec![hit.clone()]);
    }
    let reverse = ResultSink::new();
    for hit in hits.iter().rev() {
        reverse.add(vec![hit.clone()]);
    }

    let view_a = forward.view(Box::new(SourceGroupFilter));
    let view_b = reverse.view(Box::new(SourceGroupFilter));

    let groups_a = view_a.groups();
    let groups_b = view_b.groups();
    assert_eq!(groups_a.len(), groups_b.len());
    for (a, b) in groups_a.iter().zip(groups_b.iter()) {
        assert_eq!(a.key(), b.key());
        let titles_a: Vec<&str> = a.hits().iter().map(|h| h.title.as_str()).collect();
        let titles_b: Vec<&str> = b.hits().iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles_a, titles_b);
    }
}

#[test]
fn test_in_group_order_follows_comparator() {
    let sink = ResultSink::new();
    sink.add(vec![
        fixtures::hit("low", "x", 2),
        fixtures::hit("high", "x", 20),
        fixtures::hit("mid", "x", 10),
    ]);

    let view = sink.view(Box::new(SourceGroupFilter));
    let groups = view.groups();
    let titles: Vec<&str> = groups[0].hits().iter().map(|h| h.title.as_str()).collect();
    // Best-seeded first.
    assert_eq!(titles, vec!["high", "mid", "low"]);
}

#[test]
fn test_clear_propagates_and_notifies() {
    let sink = ResultSink::new();
    sink.add(vec![fixtures::hit("a", "x", 1)]);
    let view = sink.view(Box::new(SourceGroupFilter));
    let (listener, _, cleared) = CollectingListener::new();
    view.set_listener(listener);

    sink.clear();

    assert!(sink.is_empty());
    assert_eq!(view.total_hits(), 0);
    assert_eq!(cleared.load(Ordering::SeqCst), 1);
}

#[test]
fn test_set_filter_rebuilds_from_sink() {
    let sink = ResultSink::new();
    sink.add(vec![
        fixtures::hit("a", "x", 10),
        fixtures::hit("b", "y", 2),
    ]);

    let view = sink.view(Box::new(MinSeedersFilter::new(5)));
    assert_eq!(view.total_hits(), 1);

    let (listener, added, cleared) = CollectingListener::new();
    view.set_listener(listener);

    // Loosen the filter and regroup by source.
    view.set_filter(Box::new(CompositeFilter::and(vec![
        Box::new(MinSeedersFilter::new(0)),
        Box::new(SourceGroupFilter),
    ])));

    assert_eq!(cleared.load(Ordering::SeqCst), 1);
    assert_eq!(view.total_hits(), 2);
    assert_eq!(view.groups().len(), 2);

    // The rebuild is reported as one added batch.
    let added = added.lock().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].len(), 2);
}

#[test]
fn test_null_key_group_sorts_last() {
    let sink = ResultSink::new();
    sink.add(vec![
        fixtures::hit("unsourced", "", 5),
        fixtures::hit("named", "x", 5),
    ]);

    let view = sink.view(Box::new(SourceGroupFilter));
    let groups = view.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key(), &FilterKey::from_display("x"));
    assert!(groups[1].key().is_null());
}

#[test]
fn test_dropped_view_stops_receiving() {
    let sink = ResultSink::new();
    let kept = sink.view(Box::new(SourceGroupFilter));
    let dropped = sink.view(Box::new(SourceGroupFilter));
    drop(dropped);

    sink.add(vec![fixtures::hit("a", "x", 1)]);
    assert_eq!(kept.total_hits(), 1);
}

#[test]
fn test_composite_key_groups_on_non_null_dimensions() {
    let sink = ResultSink::new();
    sink.add(vec![
        fixtures::hit("a", "x", 10),
        fixtures::hit("b", "y", 10),
    ]);

    // MinSeeders contributes no key dimension, so grouping is by source.
    let view = sink.view(Box::new(CompositeFilter::and(vec![
        Box::new(MinSeedersFilter::new(0)),
        Box::new(SourceGroupFilter),
    ])));

    let groups = view.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key().display(), "x");
    assert_eq!(groups[1].key().display(), "y");
}
