//! Concrete source extractors.

mod torrents_csv;

pub use torrents_csv::TorrentsCsvSource;

use std::sync::Arc;

use dragnet_core::{SourceEntry, SourceExtractor, SourceKind};

/// Build the extractor for a configured source entry.
pub fn build_extractor(entry: &SourceEntry) -> Arc<dyn SourceExtractor> {
    match entry.kind {
        SourceKind::TorrentsCsv => Arc::new(TorrentsCsvSource::new(
            &entry.spec.name,
            entry.base_url.clone(),
        )),
    }
}
