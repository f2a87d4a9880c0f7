use crate::rank::{normalize_query, rank, SearchResult};
use crate::{build_index, Corpus, InvertedIndex, SearchError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A corpus and the index built from it. Never modified once published.
#[derive(Debug, Default)]
pub struct Generation {
    pub number: u64,
    pub corpus: Corpus,
    pub index: InvertedIndex,
}

impl Generation {
    pub fn new(number: u64, corpus: Corpus) -> Self {
        let index = build_index(&corpus);
        Self { number, corpus, index }
    }

    pub fn query(&self, text: &str) -> Result<Vec<SearchResult>, SearchError> {
        let q = normalize_query(text)?;
        Ok(rank(&q, &self.index))
    }
}

/// Serves queries against the latest published generation.
///
/// Readers take an `Arc` to the current generation; publishing swaps in a new one,
/// so a reader never sees a corpus paired with another generation's index.
#[derive(Debug, Default)]
pub struct QueryEngine {
    current: RwLock<Arc<Generation>>,
    scraping: Arc<AtomicBool>,
}

impl QueryEngine {
    pub fn new() -> Self { Self::default() }

    pub fn from_corpus(corpus: Corpus) -> Self {
        Self { current: RwLock::new(Arc::new(Generation::new(1, corpus))), scraping: Arc::default() }
    }

    pub fn current(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    pub fn query(&self, text: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.current().query(text)
    }

    /// Index a freshly crawled corpus and make it the current generation.
    pub fn publish(&self, corpus: Corpus) -> Arc<Generation> {
        // Index outside the lock; readers keep the old generation meanwhile.
        let index = build_index(&corpus);
        let next = {
            let mut current = self.current.write();
            let next = Arc::new(Generation { number: current.number + 1, corpus, index });
            *current = next.clone();
            next
        };
        tracing::info!(generation = next.number, pages = next.corpus.len(), terms = next.index.num_terms(), "published generation");
        next
    }

    /// Claim the single crawl slot. Fails while another scrape holds it.
    /// The permit is owned, so it can move into a task that outlives the caller.
    pub fn try_begin_scrape(&self) -> Result<ScrapePermit, SearchError> {
        self.scraping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SearchError::CrawlInProgress)?;
        Ok(ScrapePermit { flag: self.scraping.clone() })
    }

    pub fn is_scraping(&self) -> bool {
        self.scraping.load(Ordering::Acquire)
    }
}

/// Releases the crawl slot on drop.
#[derive(Debug)]
pub struct ScrapePermit {
    flag: Arc<AtomicBool>,
}

impl Drop for ScrapePermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
