use crate::PageId;
use thiserror::Error;

/// Errors surfaced to callers of the search and scrape operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No search query provided")]
    EmptyQuery,

    #[error("Missing start page or number of pages")]
    InvalidScrape,

    #[error("A crawl is already in progress")]
    CrawlInProgress,

    #[error("Page {0} was already stored in this generation")]
    DuplicatePage(PageId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// True for errors caused by a malformed request rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::EmptyQuery | SearchError::InvalidScrape)
    }
}
