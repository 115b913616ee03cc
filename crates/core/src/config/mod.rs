//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SQUALL_*)
//! 2. TOML config file (if SQUALL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SQUALL_*)
/// 2. TOML config file (if SQUALL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site the gateway fronts, e.g. `https://example.com`.
    ///
    /// Set via SQUALL_ORIGIN environment variable. Requests to this origin
    /// participate in the caching contract; everything else passes through
    /// unless its host matches `trusted_hosts`.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Address the gateway listens on.
    ///
    /// Set via SQUALL_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path to the SQLite outbox database.
    ///
    /// Set via SQUALL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for upstream HTTP requests.
    ///
    /// Set via SQUALL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per upstream request.
    ///
    /// Set via SQUALL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via SQUALL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Cache generation number embedded in partition names.
    ///
    /// Bumping this invalidates every prior partition on the next
    /// activation. Set via SQUALL_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,

    /// Third-party hosts allowed to participate in caching (suffix-matched),
    /// for font and image CDNs.
    ///
    /// Set via SQUALL_TRUSTED_HOSTS environment variable (comma-separated).
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Path prefix identifying API requests.
    ///
    /// Set via SQUALL_API_PREFIX environment variable.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Site paths fetched into the precache partition at install time.
    ///
    /// Set via SQUALL_PRECACHE_MANIFEST environment variable (comma-separated).
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// Path of the offline fallback document (must be precached).
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Path of the image placeholder resource (must be precached).
    #[serde(default = "default_placeholder_path")]
    pub placeholder_path: String,

    /// Path form submissions are relayed to and queued records are delivered to.
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    /// Seconds between periodic sync triggers (outbox drain + partition sweep).
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3030".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./squall-outbox.sqlite")
}

fn default_user_agent() -> String {
    "squall/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_version() -> u32 {
    1
}

fn default_trusted_hosts() -> Vec<String> {
    vec![
        "fonts.googleapis.com".into(),
        "fonts.gstatic.com".into(),
        "images.unsplash.com".into(),
    ]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_precache_manifest() -> Vec<String> {
    vec![
        "/".into(),
        "/offline.html".into(),
        "/styles/main.css".into(),
        "/scripts/app.js".into(),
        "/images/placeholder.svg".into(),
    ]
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_placeholder_path() -> String {
    "/images/placeholder.svg".into()
}

fn default_submit_path() -> String {
    "/api/contact".into()
}

fn default_sync_interval_secs() -> u64 {
    900
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            cache_version: default_cache_version(),
            trusted_hosts: default_trusted_hosts(),
            api_prefix: default_api_prefix(),
            precache_manifest: default_precache_manifest(),
            offline_path: default_offline_path(),
            placeholder_path: default_placeholder_path(),
            submit_path: default_submit_path(),
            sync_interval_secs: default_sync_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Periodic sync interval as Duration.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SQUALL_`
    /// 2. TOML file from `SQUALL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SQUALL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SQUALL_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
