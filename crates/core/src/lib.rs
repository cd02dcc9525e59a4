pub mod backends;
pub mod config;
pub mod metrics;
pub mod search;
pub mod testing;

pub use backends::{create_backends, RutorBackend, TParserBackend, YohohoBackend};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendsConfig, Config, ConfigError,
    RutorConfig, SearchConfig, ServerConfig, TParserConfig, TParserShard, YohohoConfig,
};
pub use search::{
    apply_filters, merge_records, parse_magnet, rank, Backend, BackendError, FilterSet, InfoHash,
    Magnet, MagnetError, MergedRecord, SearchCoordinator, SearchOptions, SearchReport,
    SizeTiebreak, TorrentRecord, UnresolvedPolicy,
};
