use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where object paths are resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub enum StorageConfig {
    #[serde(rename = "local")]
    Local(LocalStorageConfig),
    #[serde(rename = "s3")]
    S3(S3StorageConfig),
    #[serde(rename = "memory")]
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local(LocalStorageConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LocalStorageConfig {
    #[serde(default = "LocalStorageConfig::default_root")]
    pub root: PathBuf,
}

impl LocalStorageConfig {
    fn default_root() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct S3StorageConfig {
    pub bucket: String,
    #[serde(default = "S3StorageConfig::default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key prefix prepended to every object path.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(with = "humantime_serde", default = "S3StorageConfig::default_timeout")]
    pub timeout: Duration,
}

impl S3StorageConfig {
    pub fn default_region() -> String {
        String::from("us-east-1")
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }
}
