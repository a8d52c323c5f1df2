use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fs::FileServer;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{get, routes, State};
use serde::Serialize;
use tracing::{error, info, warn};

use common::Config;

use crate::cache::ResultCache;
use crate::model::{ScoredArticle, SearchQuery};
use crate::newsapi::NewsProvider;
use crate::sentiment::{Distribution, SentimentAnalyzer};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    /// None when the API key env var is unset; searches then surface the
    /// missing-key error instead of the process refusing to start.
    pub provider: Option<Arc<dyn NewsProvider>>,
    pub analyzer: Arc<SentimentAnalyzer>,
    pub cache: Arc<ResultCache<SearchResponse>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, provider: Option<Arc<dyn NewsProvider>>) -> Self {
        let analyzer = Arc::new(SentimentAnalyzer::new(&config.sentiment));
        let cache = Arc::new(ResultCache::from_config(&config.cache));
        Self {
            started_at: Utc::now(),
            config,
            provider,
            analyzer,
            cache,
        }
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    api_key_configured: bool,
    defaults: SearchDefaults,
    languages: BTreeMap<String, String>,
    sort_options: Vec<String>,
}

#[derive(Serialize)]
struct SearchDefaults {
    topic: String,
    language: String,
    page_size: u32,
    sort_by: String,
    max_articles: u32,
}

/// Full payload for one search. Errors and warnings ride along so the
/// dashboard can render them next to whatever results exist.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub query: SearchQuery,
    pub articles: Vec<ScoredArticle>,
    pub summary: Distribution,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub cached: bool,
}

impl SearchResponse {
    fn empty(query: &SearchQuery) -> Self {
        Self {
            query: query.clone(),
            articles: Vec::new(),
            summary: Distribution::default(),
            warnings: Vec::new(),
            errors: Vec::new(),
            cached: false,
        }
    }
}

/// Redirect root to the static dashboard
#[get("/")]
async fn index_redirect() -> Redirect {
    Redirect::to("/static/index.html")
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint: uptime plus the form defaults and option lists the
/// dashboard needs to build its search controls.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();
    let search = &state.config.search;

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        api_key_configured: state.provider.is_some(),
        defaults: SearchDefaults {
            topic: search.default_topic().to_string(),
            language: search.default_language().to_string(),
            page_size: search.default_page_size(),
            sort_by: search.default_sort().to_string(),
            max_articles: search.max_articles(),
        },
        languages: search.languages.clone(),
        sort_options: search.sort_options.clone(),
    })
}

/// Search endpoint. Missing parameters fall back to the configured defaults;
/// only a blank topic is a client error. Fetch failures are reported inside
/// the JSON payload (spec'd error surface is the dashboard, not HTTP codes).
#[get("/api/v1/search?<topic>&<language>&<page_size>&<sort_by>")]
async fn search(
    state: &State<AppState>,
    topic: Option<String>,
    language: Option<String>,
    page_size: Option<u32>,
    sort_by: Option<String>,
) -> Result<Json<SearchResponse>, Status> {
    let cfg = &state.config.search;

    let topic = topic.unwrap_or_else(|| cfg.default_topic().to_string());
    if topic.trim().is_empty() {
        return Err(Status::BadRequest);
    }

    let query = SearchQuery {
        topic: topic.trim().to_string(),
        language: language.unwrap_or_else(|| cfg.default_language().to_string()),
        page_size: page_size
            .unwrap_or_else(|| cfg.default_page_size())
            .clamp(1, cfg.max_articles()),
        sort_by: sort_by.unwrap_or_else(|| cfg.default_sort().to_string()),
    };

    Ok(Json(execute_search(state.inner(), query).await))
}

/// Run one search end to end: cache lookup, vendor fetch, sentiment pass,
/// cache fill. Never fails; problems land in `errors`/`warnings`.
pub async fn execute_search(state: &AppState, query: SearchQuery) -> SearchResponse {
    if let Some(mut hit) = state.cache.get(&query).await {
        hit.cached = true;
        return hit;
    }

    let mut response = SearchResponse::empty(&query);

    let provider = match &state.provider {
        Some(p) => p,
        None => {
            response.errors.push(format!(
                "NewsAPI key is not configured; set the {} environment variable",
                state.config.newsapi.api_key_env()
            ));
            return response;
        }
    };

    match provider.search(&query).await {
        Ok(articles) if articles.is_empty() => {
            response.warnings.push(format!(
                "No news found for topic '{}' in language '{}'.",
                query.topic, query.language
            ));
        }
        Ok(articles) => {
            info!(topic = %query.topic, count = articles.len(), "scoring fetched articles");
            let (scored, summary) = state.analyzer.score_articles(articles);
            response.articles = scored;
            response.summary = summary;
        }
        Err(e) => {
            error!(topic = %query.topic, error = %e, "news fetch failed");
            response.errors.push(format!("{e:#}"));
        }
    }

    // Only successful fetches are worth caching; errors should retry.
    if response.errors.is_empty() {
        state.cache.put(query, response.clone()).await;
    }

    response
}

/// Attach managed state and the API routes to a Rocket instance. Split out
/// from `launch_rocket` so local-client tests can drive the handlers without
/// the static file server.
pub fn mount_api(
    rocket: rocket::Rocket<rocket::Build>,
    state: AppState,
) -> rocket::Rocket<rocket::Build> {
    rocket
        .manage(state)
        .mount("/", routes![index_redirect, health, status, search])
}

/// Build and launch a Rocket server.
///
/// Bind address and port come from the `[server]` config section, merged over
/// Rocket's own figment defaults. This function blocks until the Rocket
/// server shuts down and returns an error if Rocket fails to start.
pub async fn launch_rocket(
    config: Arc<Config>,
    provider: Option<Arc<dyn NewsProvider>>,
) -> Result<()> {
    let static_dir = config
        .server
        .static_dir
        .clone()
        .unwrap_or_else(|| "newspulse/static".to_string());

    let mut fig = rocket::Config::figment();
    if let Some(ref bind) = config.server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = config.server.port {
        fig = fig.merge(("port", port));
    }

    if provider.is_none() {
        warn!(
            "starting without a news provider; searches will report the missing {} key",
            config.newsapi.api_key_env()
        );
    }

    let state = AppState::new(config, provider);

    let rocket =
        mount_api(rocket::custom(fig), state).mount("/static", FileServer::from(static_dir));

    info!("Starting Rocket HTTP server");
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    info!("Rocket HTTP server has shut down");
    Ok(())
}
