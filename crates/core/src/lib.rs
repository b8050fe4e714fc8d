//! mediadex core: a federated media index.
//!
//! The index assigns a compact, collision-resistant identifier to each
//! ingested media item, routes new writes between two independent shards
//! based on a measured size threshold, executes pattern search
//! concurrently across both shards with merged pagination, and groups
//! results into episodes.

pub mod codec;
pub mod config;
pub mod grouper;
pub mod groups;
pub mod metrics;
pub mod monitor;
pub mod router;
pub mod search;
pub mod shard;
pub mod testing;

pub use codec::{
    decode_provider_token, decode_ref, encode_id, encode_provider_token, encode_ref,
    unpack_provider_token, CodecError, PackedMediaRef, ProviderMediaRef,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, RoutingConfig,
    SanitizedConfig, SearchConfig, ServerConfig, ShardsConfig,
};
pub use grouper::{extract_episode, group, EpisodeGroup, OTHER_GROUP};
pub use groups::{GroupError, GroupStore, MediaGroup, SqliteGroupStore};
pub use monitor::SizeMonitor;
pub use router::{
    sanitize_name, IngestError, IngestOutcome, IngestRequest, WriteRouter,
};
pub use search::{
    build_match_pattern, FederatedSearch, SearchError, SearchPage, SearchRequest, END_OF_RESULTS,
};
pub use shard::{
    InsertOutcome, MediaFilter, MediaRecord, Shard, ShardError, ShardName, ShardStats, SqliteShard,
};
