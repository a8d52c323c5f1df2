/*!
common/src/lib.rs

Shared configuration types for Newspulse.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default + override merging
- Resolved accessors that apply the built-in defaults
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in fallbacks used when the config file omits a value.
pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_API_KEY_ENV: &str = "NEWSAPI_KEY";
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 15;
/// NewsAPI rejects pageSize above 100.
pub const NEWSAPI_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_NEGATIVE_THRESHOLD: f64 = -0.05;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 1800;
pub const DEFAULT_MAX_ARTICLES: u32 = 50;

/// HTTP server configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the Rocket server (e.g. "0.0.0.0")
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Directory served under /static (the dashboard)
    pub static_dir: Option<String>,
}

/// NewsAPI vendor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsApiConfig {
    /// Endpoint URL; defaults to the /v2/everything endpoint
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    /// The key itself never lives in the config file.
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Upper bound for the pageSize request parameter
    pub max_page_size: Option<u32>,
}

impl NewsApiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_NEWSAPI_BASE_URL)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS)
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
            .unwrap_or(NEWSAPI_MAX_PAGE_SIZE)
            .min(NEWSAPI_MAX_PAGE_SIZE)
    }
}

/// VADER compound-score thresholds for labelling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub positive_threshold: Option<f64>,
    pub negative_threshold: Option<f64>,
}

impl SentimentConfig {
    pub fn positive_threshold(&self) -> f64 {
        self.positive_threshold.unwrap_or(DEFAULT_POSITIVE_THRESHOLD)
    }

    pub fn negative_threshold(&self) -> f64 {
        self.negative_threshold.unwrap_or(DEFAULT_NEGATIVE_THRESHOLD)
    }
}

/// Search form defaults and option lists surfaced to the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_topic: Option<String>,
    /// ISO language code (e.g. "en")
    pub default_language: Option<String>,
    pub default_page_size: Option<u32>,
    /// Display cap for a single search
    pub max_articles: Option<u32>,
    /// Display label -> language code, e.g. { "English" = "en" }
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    /// Allowed sortBy values, first entry is the default
    #[serde(default)]
    pub sort_options: Vec<String>,
}

impl SearchConfig {
    pub fn default_topic(&self) -> &str {
        self.default_topic
            .as_deref()
            .unwrap_or("artificial intelligence")
    }

    pub fn default_language(&self) -> &str {
        self.default_language.as_deref().unwrap_or("en")
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size.unwrap_or(10)
    }

    pub fn max_articles(&self) -> u32 {
        self.max_articles.unwrap_or(DEFAULT_MAX_ARTICLES)
    }

    pub fn default_sort(&self) -> &str {
        self.sort_options
            .first()
            .map(String::as_str)
            .unwrap_or("relevancy")
    }
}

/// In-memory result cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: Option<bool>,
    pub ttl_seconds: Option<u64>,
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS)
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub newsapi: NewsApiConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Sanity-check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let pos = self.sentiment.positive_threshold();
        let neg = self.sentiment.negative_threshold();
        if neg > pos {
            anyhow::bail!(
                "sentiment.negative_threshold ({}) must not exceed sentiment.positive_threshold ({})",
                neg,
                pos
            );
        }
        if self.search.default_page_size() == 0 {
            anyhow::bail!("search.default_page_size must be at least 1");
        }
        if self.search.max_articles() == 0 {
            anyhow::bail!("search.max_articles must be at least 1");
        }
        if self.newsapi.max_page_size() == 0 {
            anyhow::bail!("newsapi.max_page_size must be at least 1");
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
