//! Application configuration. Endpoints, retry policy, paths.

use serde::Deserialize;
use std::time::Duration;

/// Fixed ceiling for one datamart request. Independent of the retry/backoff settings.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra attempts after the first one (4 attempts in total).
pub const DEFAULT_RETRIES: u32 = 3;

/// Backoff base; doubled after every failed attempt (700, 1400, 2800 ms ...).
pub const DEFAULT_BASE_DELAY_MS: u64 = 700;

/// View offered to the user when the datamart cannot be loaded.
pub const DEFAULT_RECOVERY_HINT: &str = "/Dashboard-bicentenario";

pub const DEFAULT_EXPORT_DIR: &str = "./exports";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bulk datamart endpoint. Read from DASH_DATAMART_URL.
    #[serde(default)]
    pub datamart_url: Option<String>,

    /// Local JSON file used when no URL is set (development). Read from DASH_DATAMART_FILE.
    #[serde(default)]
    pub datamart_file: Option<String>,

    /// Per-metric statistics API root. Read from DASH_STATS_API_URL.
    #[serde(default)]
    pub stats_api_url: Option<String>,

    /// Read from DASH_RETRIES.
    #[serde(default)]
    pub retries: Option<u32>,

    /// Read from DASH_BASE_DELAY_MS.
    #[serde(default)]
    pub base_delay_ms: Option<u64>,

    /// Read from DASH_RECOVERY_HINT.
    #[serde(default)]
    pub recovery_hint: Option<String>,

    /// Read from DASH_EXPORT_DIR.
    #[serde(default)]
    pub export_dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("DASH_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("DASH"));
        c.build()?.try_deserialize()
    }

    pub fn retries_or_default(&self) -> u32 {
        self.retries.unwrap_or(DEFAULT_RETRIES)
    }

    /// Backoff base in milliseconds. Never below 1.
    pub fn base_delay_ms_or_default(&self) -> u64 {
        self.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS).max(1)
    }

    pub fn recovery_hint_or_default(&self) -> String {
        self.recovery_hint
            .clone()
            .unwrap_or_else(|| DEFAULT_RECOVERY_HINT.to_string())
    }

    pub fn export_dir_or_default(&self) -> String {
        self.export_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_string())
    }

    /// Datamart URL, ignoring blank values.
    pub fn datamart_url(&self) -> Option<String> {
        non_blank(&self.datamart_url)
    }

    pub fn datamart_file(&self) -> Option<String> {
        non_blank(&self.datamart_file)
    }

    pub fn stats_api_url(&self) -> Option<String> {
        non_blank(&self.stats_api_url)
    }
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
