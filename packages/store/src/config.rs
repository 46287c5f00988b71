use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Remote relational store holding the test records.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. Default: "postgres://localhost/packtest".
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "postgres://localhost/packtest".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Remote S3-compatible bucket holding uploaded images.
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStorageConfig {
    /// Default: "test-images".
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services. Unset means AWS.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Address objects as `endpoint/bucket/key`. Default: true.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
    /// Key prefix for uploaded objects, without trailing slash. Default: "".
    #[serde(default)]
    pub prefix: String,
}

fn default_path_style() -> bool {
    true
}
fn default_bucket() -> String {
    "test-images".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: default_path_style(),
            prefix: String::new(),
        }
    }
}

/// Origin-local fallback persistence.
#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    /// Directory for the record snapshot. Default: "./data".
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Namespaced key the snapshot is stored under. Default: "packaging_test_db_v6".
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
    /// Embedded image store. Default: "sqlite://./data/images.db?mode=rwc".
    #[serde(default = "default_blob_db_url")]
    pub blob_db_url: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_snapshot_key() -> String {
    "packaging_test_db_v6".into()
}
fn default_blob_db_url() -> String {
    "sqlite://./data/images.db?mode=rwc".into()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_key: default_snapshot_key(),
            blob_db_url: default_blob_db_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// How long a fetched record list is served without re-querying. Default: 5000.
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: u64,
}

fn default_freshness_ms() -> u64 {
    5000
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.freshness_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_ms: default_freshness_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvictionConfig {
    /// Local images older than this are swept. Default: 30.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    /// Time between sweeps. Default: 86400 (daily).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_retention_days() -> u64 {
    30
}
fn default_interval_secs() -> u64 {
    24 * 60 * 60
}

impl EvictionConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days * 24 * 60 * 60)
    }

    /// Zero is treated as one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub object_storage: ObjectStorageConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub eviction: EvictionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PACKTEST_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., PACKTEST__DATABASE__URL)
            .add_source(Environment::with_prefix("PACKTEST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
