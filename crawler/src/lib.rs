//! Bounded breadth-first crawling of Wikipedia articles into a corpus store.

pub mod crawl;
pub mod extract;
pub mod fetch;

pub use crawl::{CrawlReport, Crawler};
pub use extract::{ContentExtractor, Element, Extracted, HtmlParser, ScraperParser};
pub use fetch::{FetchError, FetcherConfig, HttpFetcher, PageFetcher};
