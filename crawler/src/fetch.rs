use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use wikisearch_core::PageId;

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_USER_AGENT: &str = "wikisearch-bot/0.1 (+https://example.com/bot)";
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid page url for {id}: {source}")]
    Url { id: PageId, source: url::ParseError },

    #[error("request for {url} failed: {source}")]
    Http { url: Url, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    Status { url: Url, status: u16 },

    #[error("{url} body is too large")]
    TooLarge { url: Url },
}

/// Retrieves the raw content of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, id: &PageId) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(12),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fetches pages over HTTP relative to a base URL.
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .build()?;
        let base = Url::parse(&config.base_url)?;
        Ok(Self { client, base })
    }

    pub fn url_for(&self, id: &PageId) -> Result<Url, FetchError> {
        self.base.join(id.as_str()).map_err(|source| FetchError::Url { id: id.clone(), source })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, id: &PageId) -> Result<String, FetchError> {
        let url = self.url_for(id)?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(FetchError::Status { url, status: resp.status().as_u16() });
        }
        let bytes = resp.bytes().await.map_err(|source| FetchError::Http { url: url.clone(), source })?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err(FetchError::TooLarge { url });
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
