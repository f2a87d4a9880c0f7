use anyhow::Result;
use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post}, Json, Router};
use crawler::{ContentExtractor, CrawlReport, Crawler, FetcherConfig, HttpFetcher, ScraperParser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wikisearch_core::{CorpusStore, PageId, QueryEngine, SearchError, SearchResult};

pub struct ServerConfig {
    pub corpus_dir: PathBuf,
    pub fetcher: FetcherConfig,
    pub concurrency: usize,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Optional display cap; ranking itself never truncates.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    #[serde(default)]
    pub start_page: Option<String>,
    #[serde(default)]
    pub number_of_pages: Option<i64>,
}

impl ScrapeRequest {
    /// Both fields present and positive; the start page becomes a canonical article id.
    pub fn validate(&self) -> Result<(PageId, usize), SearchError> {
        let start = self
            .start_page
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SearchError::InvalidScrape)?;
        let pages = self.number_of_pages.filter(|n| *n > 0).ok_or(SearchError::InvalidScrape)?;
        Ok((PageId::from_phrase(start), pages as usize))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub message: String,
    pub start_page: PageId,
    pub pages: usize,
    pub failed: Vec<PageId>,
    pub generation: u64,
    pub took_s: f64,
}

#[derive(Serialize)]
pub struct PageResponse {
    pub name: PageId,
    pub title: String,
    pub text: String,
    pub links: Vec<PageId>,
    pub generation: u64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub generation: u64,
    pub pages: usize,
    pub terms: usize,
    pub created_at: Option<String>,
    pub scraping: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    pub crawler: Arc<Crawler>,
}

impl AppState {
    pub fn new(engine: QueryEngine, crawler: Crawler) -> Self {
        Self { engine: Arc::new(engine), crawler: Arc::new(crawler) }
    }
}

pub fn build_app(config: &ServerConfig) -> Result<Router> {
    // Serve whatever generation is already on disk until the first scrape.
    let store = CorpusStore::new(&config.corpus_dir);
    let corpus = store.load()?;
    let engine = if corpus.is_empty() { QueryEngine::new() } else { QueryEngine::from_corpus(corpus) };

    let fetcher = HttpFetcher::new(&config.fetcher)?;
    let crawler = Crawler::new(Arc::new(fetcher), ContentExtractor::new(ScraperParser), store)
        .with_concurrency(config.concurrency);
    Ok(router(AppState::new(engine, crawler)))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status_handler))
        .route("/search", post(search_handler))
        .route("/scrape", post(scrape_handler))
        .route("/page/:name", get(page_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, (StatusCode, String)> {
    let query = req.query.unwrap_or_default();
    let mut results = state.engine.query(&query).map_err(error_response)?;
    if let Some(limit) = req.limit {
        results.truncate(limit);
    }
    Ok(Json(results))
}

pub async fn scrape_handler(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, (StatusCode, String)> {
    let (seed, max_pages) = req.validate().map_err(error_response)?;
    let permit = state.engine.try_begin_scrape().map_err(error_response)?;

    tracing::info!(%seed, max_pages, "scraping");
    let start = Instant::now();
    // Crawl and publish in their own task: a client that disconnects drops only
    // the join handle, never a half-written generation.
    let job = tokio::spawn({
        let state = state.clone();
        let seed = seed.clone();
        async move {
            let _permit = permit;
            let CrawlReport { corpus, failed } = state.crawler.crawl(&seed, max_pages).await?;
            let pages = corpus.len();
            let engine = state.engine.clone();
            let generation = tokio::task::spawn_blocking(move || engine.publish(corpus)).await?;
            anyhow::Ok((pages, failed, generation.number))
        }
    });
    let (pages, failed, generation) = job.await.map_err(internal_error)?.map_err(internal_error)?;

    Ok(Json(ScrapeResponse {
        message: "Scraping complete".into(),
        start_page: seed,
        pages,
        failed,
        generation,
        took_s: start.elapsed().as_secs_f64(),
    }))
}

pub async fn page_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PageResponse>, (StatusCode, String)> {
    let generation = state.engine.current();
    let page = generation
        .corpus
        .find_by_file_name(&name)
        .ok_or((StatusCode::NOT_FOUND, "not found".to_string()))?;
    Ok(Json(PageResponse {
        name: page.id.clone(),
        title: page.id.title(),
        text: page.text.clone(),
        links: page.links.clone(),
        generation: generation.number,
    }))
}

pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let generation = state.engine.current();
    Json(StatusResponse {
        generation: generation.number,
        pages: generation.corpus.len(),
        terms: generation.index.num_terms(),
        created_at: generation.corpus.created_at().map(str::to_string),
        scraping: state.engine.is_scraping(),
    })
}

fn error_response(err: SearchError) -> (StatusCode, String) {
    let status = match &err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        SearchError::CrawlInProgress => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Fetcher defaults with a caller-chosen timeout, as used by the binary.
pub fn fetcher_config(base_url: String, timeout_secs: u64, user_agent: String) -> FetcherConfig {
    FetcherConfig { base_url, timeout: Duration::from_secs(timeout_secs), user_agent }
}
