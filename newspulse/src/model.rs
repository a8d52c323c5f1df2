use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentScore;

/// A single news article, normalized from the vendor response.
/// Transient: lives for one request/response cycle (plus the TTL cache).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub author: Option<String>,
    /// Short excerpt; this is the text the sentiment pass scores
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

impl Article {
    /// Human-readable publication date for the dashboard,
    /// e.g. "25 December 2023, 15:30".
    pub fn published_display(&self) -> String {
        match self.published_at {
            Some(dt) => dt.format("%d %B %Y, %H:%M").to_string(),
            None => "No Date".to_string(),
        }
    }
}

/// An article with its sentiment attached. `sentiment` is None when the
/// article has no description to score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub published_display: String,
    pub sentiment: Option<SentimentScore>,
}

/// Parameters of one search, also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub topic: String,
    pub language: String,
    pub page_size: u32,
    pub sort_by: String,
}
