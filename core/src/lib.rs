//! Corpus storage, positional indexing and relevance ranking for crawled
//! Wikipedia pages.

pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod page;
pub mod persist;
pub mod rank;
pub mod tokenizer;

pub use corpus::{Corpus, CorpusStore, CorpusWriter};
pub use engine::{Generation, QueryEngine, ScrapePermit};
pub use error::SearchError;
pub use index::{build_index, InvertedIndex, Posting};
pub use page::{PageId, PageRecord, ARTICLE_PREFIX};
pub use rank::{normalize_query, rank, SearchResult};
