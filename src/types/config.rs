use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platform;

/// Largest page size the Raindrop API accepts.
pub const API_MAX_PAGE_SIZE: u32 = 50;

/// Top-level configuration, built once and handed to each component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how to page through the bookmark collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// `0` means every collection.
    pub collection_id: i64,
    pub page_size: u32,
    /// Hard cap on pages per fetch; a larger reported count is fatal.
    pub max_pages: u32,
    /// Server-side search filter; `"❤️"` restricts results to favourites.
    pub search: Option<String>,
    /// Environment variable consulted when no inline token is set.
    pub access_token_env: String,
    pub access_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.raindrop.io/rest/v1".to_string(),
            collection_id: 0,
            page_size: 25,
            max_pages: 200,
            search: Some("❤️".to_string()),
            access_token_env: "RAINDROP_ACCESS_TOKEN".to_string(),
            access_token: None,
        }
    }
}

/// Exponential backoff for transient page-request failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// Locations of the tracking store's snapshot directory and pointer file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub snapshot_dir: PathBuf,
    pub pointer_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = platform::get_data_dir();
        Self {
            snapshot_dir: data_dir.join("rts.db"),
            pointer_path: data_dir.join("metafile").join("metafile.txt"),
        }
    }
}

impl StoreConfig {
    /// A store rooted entirely inside `dir`. Handy for tests and portable installs.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            snapshot_dir: dir.join("rts.db"),
            pointer_path: dir.join("metafile").join("metafile.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Daily-rolling log file directory; `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: Some(platform::get_data_dir().join("logs")),
        }
    }
}
