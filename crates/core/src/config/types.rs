use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shards: ShardsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Shard database locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShardsConfig {
    #[serde(default = "default_primary_path")]
    pub primary_path: PathBuf,
    #[serde(default = "default_secondary_path")]
    pub secondary_path: PathBuf,
    /// Saved group store; lives next to the primary by default.
    #[serde(default = "default_groups_path")]
    pub groups_path: PathBuf,
}

impl Default for ShardsConfig {
    fn default() -> Self {
        Self {
            primary_path: default_primary_path(),
            secondary_path: default_secondary_path(),
            groups_path: default_groups_path(),
        }
    }
}

fn default_primary_path() -> PathBuf {
    PathBuf::from("mediadex-primary.db")
}

fn default_secondary_path() -> PathBuf {
    PathBuf::from("mediadex-secondary.db")
}

fn default_groups_path() -> PathBuf {
    PathBuf::from("mediadex-groups.db")
}

/// Write routing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Primary shard size at which new writes move to the secondary.
    #[serde(default = "default_migration_threshold_mb")]
    pub migration_threshold_mb: u64,
    /// How long a size measurement stays fresh.
    #[serde(default = "default_size_cache_ttl_secs")]
    pub size_cache_ttl_secs: u64,
}

impl RoutingConfig {
    pub fn migration_threshold_bytes(&self) -> u64 {
        self.migration_threshold_mb * 1024 * 1024
    }

    pub fn size_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.size_cache_ttl_secs)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            migration_threshold_mb: default_migration_threshold_mb(),
            size_cache_ttl_secs: default_size_cache_ttl_secs(),
        }
    }
}

fn default_migration_threshold_mb() -> u64 {
    450
}

fn default_size_cache_ttl_secs() -> u64 {
    600
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Default page size when a request does not set one.
    #[serde(default = "default_max_results")]
    pub max_results: u64,
    /// Whether patterns also match against captions.
    #[serde(default = "default_use_caption_filter")]
    pub use_caption_filter: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            use_caption_filter: default_use_caption_filter(),
        }
    }
}

fn default_max_results() -> u64 {
    10
}

fn default_use_caption_filter() -> bool {
    true
}

/// Config view for API responses (paths rendered as plain strings)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub shards: SanitizedShardsConfig,
    pub routing: RoutingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedShardsConfig {
    pub primary_path: String,
    pub secondary_path: String,
    pub groups_path: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            shards: SanitizedShardsConfig {
                primary_path: config.shards.primary_path.display().to_string(),
                secondary_path: config.shards.secondary_path.display().to_string(),
                groups_path: config.shards.groups_path.display().to_string(),
            },
            routing: config.routing.clone(),
            search: config.search.clone(),
        }
    }
}
