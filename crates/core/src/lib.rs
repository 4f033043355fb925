pub mod config;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod search;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SearchConfig,
    ServerConfig, SourceEntry, SourceKind,
};
pub use fetcher::{FetchError, FetchMethod, FetchRequest, HttpFetcher, PageFetcher};
pub use filter::{
    CompositeFilter, FilterKey, FilteredView, MinSeedersFilter, ResultSink, SearchFilter,
    SearchGroup, SinkListener, SourceGroupFilter, ViewListener,
};
pub use search::{
    encode_keywords, magnet_info_hash, ExtractError, SearchHit, SearchManager, SearchPerformer,
    SearchPhase, SearchToken, SessionListener, SourceError, SourceErrorKind, SourceExtractor,
    SourceSpec,
};
