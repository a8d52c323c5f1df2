use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use common::Config;
use newspulse::model::{Article, SearchQuery};
use newspulse::newsapi::NewsProvider;
use newspulse::sentiment::SentimentLabel;
use newspulse::server::{execute_search, AppState};

/// Canned provider so the pipeline can be exercised without the vendor.
struct StubProvider {
    articles: Vec<Article>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn returning(articles: Vec<Article>) -> Self {
        Self {
            articles,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            articles: Vec::new(),
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NewsProvider for StubProvider {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<Article>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(msg) => Err(anyhow::anyhow!("{}", msg)),
            None => Ok(self.articles.clone()),
        }
    }
}

fn article(title: &str, description: Option<&str>) -> Article {
    Article {
        title: title.to_string(),
        source: "Test Source".to_string(),
        author: None,
        description: description.map(str::to_string),
        url: Some("https://example.com/a".to_string()),
        image_url: None,
        published_at: None,
        content: None,
    }
}

fn query(topic: &str) -> SearchQuery {
    SearchQuery {
        topic: topic.to_string(),
        language: "en".to_string(),
        page_size: 10,
        sort_by: "relevancy".to_string(),
    }
}

fn state_with(provider: Arc<dyn NewsProvider>) -> AppState {
    AppState::new(Arc::new(Config::default()), Some(provider))
}

#[tokio::test]
async fn search_scores_articles_and_builds_summary() {
    let provider = Arc::new(StubProvider::returning(vec![
        article("good", Some("This is wonderful, amazing and fantastic news!")),
        article("bad", Some("A terrible, horrible disaster killed many people.")),
        article("plain", Some("The meeting is scheduled for Tuesday at noon.")),
        article("no description", None),
    ]));
    let state = state_with(provider);

    let response = execute_search(&state, query("mixed")).await;

    assert!(response.errors.is_empty());
    assert!(response.warnings.is_empty());
    assert_eq!(response.articles.len(), 4);
    assert_eq!(response.summary.scored, 3);
    assert_eq!(response.summary.positive, 1);
    assert_eq!(response.summary.negative, 1);
    assert_eq!(response.summary.neutral, 1);

    let first = response.articles[0].sentiment.expect("first article scored");
    assert_eq!(first.label, SentimentLabel::Positive);
    assert!(response.articles[3].sentiment.is_none());
}

#[tokio::test]
async fn second_identical_search_is_served_from_cache() {
    let provider = Arc::new(StubProvider::returning(vec![article(
        "one",
        Some("Quite a pleasant day."),
    )]));
    let state = state_with(provider.clone());

    let first = execute_search(&state, query("cached")).await;
    assert!(!first.cached);

    let second = execute_search(&state, query("cached")).await;
    assert!(second.cached);
    assert_eq!(second.articles.len(), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // A different query must not hit the cached entry
    let other = execute_search(&state, query("different")).await;
    assert!(!other.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn provider_failure_lands_in_errors_and_is_not_cached() {
    let provider = Arc::new(StubProvider::failing("NewsAPI rate limit exceeded (HTTP 429)"));
    let state = state_with(provider.clone());

    let response = execute_search(&state, query("failing")).await;
    assert!(response.articles.is_empty());
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].contains("429"));

    // Failed searches retry on the next request instead of caching the error
    let again = execute_search(&state, query("failing")).await;
    assert!(!again.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_result_produces_a_warning() {
    let provider = Arc::new(StubProvider::returning(Vec::new()));
    let state = state_with(provider);

    let response = execute_search(&state, query("nothing here")).await;
    assert!(response.errors.is_empty());
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("nothing here"));
    assert_eq!(response.summary.scored, 0);
}

#[tokio::test]
async fn missing_provider_reports_missing_key() {
    let state = AppState::new(Arc::new(Config::default()), None);

    let response = execute_search(&state, query("anything")).await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].contains("NEWSAPI_KEY"));
}
