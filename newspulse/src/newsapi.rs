use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::model::{Article, SearchQuery};

/// Seam for news vendors. The production implementation talks to NewsAPI;
/// tests substitute canned providers.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch articles matching the query. An empty result is Ok; vendor
    /// rejections and transport failures are Err with an operator-readable
    /// message.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>>;
}

/// HTTP client for the NewsAPI /v2/everything endpoint.
pub struct NewsApiProvider {
    base_url: String,
    api_key: String,
    max_page_size: u32,
    client: Client,
}

impl NewsApiProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
        max_page_size: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Newspulse/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_page_size,
            client,
        })
    }

    /// Build a provider from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(cfg: &common::NewsApiConfig) -> Result<Self> {
        let api_key = std::env::var(cfg.api_key_env()).with_context(|| {
            format!("NewsAPI key env var '{}' not set", cfg.api_key_env())
        })?;
        Self::new(
            cfg.base_url(),
            api_key,
            cfg.timeout_seconds(),
            cfg.max_page_size(),
        )
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>> {
        let page_size = query.page_size.clamp(1, self.max_page_size).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query.topic.as_str()),
                ("language", query.language.as_str()),
                ("pageSize", page_size.as_str()),
                ("sortBy", query.sort_by.as_str()),
            ])
            // Header keeps the key out of URLs and access logs
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("network error while contacting NewsAPI")?;

        let status = response.status();
        if !status.is_success() {
            // Map vendor status codes to messages the dashboard can show as-is
            let msg = match status.as_u16() {
                400 => "NewsAPI rejected the request parameters (HTTP 400); check the topic and language inputs".to_string(),
                401 => "NewsAPI key was rejected (HTTP 401); verify the configured key".to_string(),
                429 => "NewsAPI rate limit exceeded (HTTP 429); wait before searching again".to_string(),
                s if s >= 500 => format!("NewsAPI is temporarily unavailable (HTTP {})", s),
                s => format!("NewsAPI request failed with HTTP {}", s),
            };
            anyhow::bail!(msg);
        }

        let envelope: Envelope = response
            .json()
            .await
            .context("NewsAPI response was not valid JSON")?;

        if envelope.status != "ok" {
            anyhow::bail!(
                "NewsAPI error {}: {}",
                envelope.code.as_deref().unwrap_or("unknown"),
                envelope.message.as_deref().unwrap_or("no message")
            );
        }

        debug!(
            total = envelope.total_results.unwrap_or(0),
            returned = envelope.articles.len(),
            topic = %query.topic,
            "NewsAPI search completed"
        );

        Ok(envelope
            .articles
            .into_iter()
            .map(WireArticle::into_article)
            .collect())
    }
}

// NewsAPI wire format. Every article field may be null in practice.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "totalResults")]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<WireArticle>,
}

#[derive(Debug, Deserialize)]
struct WireArticle {
    #[serde(default)]
    source: Option<WireSource>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSource {
    #[serde(default)]
    name: Option<String>,
}

impl WireArticle {
    fn into_article(self) -> Article {
        Article {
            title: self.title.unwrap_or_else(|| "No Title".to_string()),
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "No Source".to_string()),
            author: self.author,
            description: self.description,
            url: self.url,
            image_url: self.url_to_image,
            published_at: self.published_at.as_deref().and_then(parse_published),
            content: self.content,
        }
    }
}

/// Parse a NewsAPI publishedAt timestamp (RFC 3339). Unparseable dates are
/// dropped rather than failing the whole response.
fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!(raw, %e, "failed to parse publishedAt");
            None
        }
    }
}
