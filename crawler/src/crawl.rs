use crate::extract::{ContentExtractor, Extracted, HtmlParser, ScraperParser};
use crate::fetch::PageFetcher;
use anyhow::{bail, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::task::JoinSet;
use wikisearch_core::{Corpus, CorpusStore, CorpusWriter, PageId, PageRecord};

/// Outcome of one crawl: the new corpus generation and the pages whose fetch failed.
#[derive(Debug)]
pub struct CrawlReport {
    pub corpus: Corpus,
    pub failed: Vec<PageId>,
}

struct Visit {
    record: PageRecord,
    fetch_failed: bool,
}

/// Breadth-first crawler writing each visited page to a [`CorpusStore`].
///
/// A single coordinator owns the frontier and the visited set; up to
/// `concurrency` fetch + extract tasks run at once.
pub struct Crawler<P = ScraperParser> {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ContentExtractor<P>>,
    store: CorpusStore,
    concurrency: usize,
}

impl<P: HtmlParser + 'static> Crawler<P> {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: ContentExtractor<P>, store: CorpusStore) -> Self {
        Self { fetcher, extractor: Arc::new(extractor), store, concurrency: 1 }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &CorpusStore { &self.store }

    /// Crawl from `seed` until `max_pages` pages are visited or nothing is left to visit.
    /// The previously persisted generation is discarded first.
    pub async fn crawl(&self, seed: &PageId, max_pages: usize) -> Result<CrawlReport> {
        if max_pages == 0 {
            bail!("max_pages must be positive");
        }
        tracing::info!(%seed, max_pages, concurrency = self.concurrency, "crawl started");

        let mut writer = self.store.begin_generation()?;
        let mut frontier: VecDeque<PageId> = VecDeque::from([seed.clone()]);
        let mut visited: HashSet<PageId> = HashSet::new();
        let mut inflight: JoinSet<Visit> = JoinSet::new();
        let mut failed = Vec::new();

        while visited.len() < max_pages && (!frontier.is_empty() || !inflight.is_empty()) {
            // Fill workers
            while inflight.len() < self.concurrency && visited.len() < max_pages {
                let Some(id) = frontier.pop_front() else { break };
                if !visited.insert(id.clone()) {
                    continue;
                }
                inflight.spawn(visit(self.fetcher.clone(), self.extractor.clone(), id));
            }

            let Some(joined) = inflight.join_next().await else { break };
            let page = joined?;
            for link in &page.record.links {
                if !visited.contains(link) {
                    frontier.push_back(link.clone());
                }
            }
            persist(&mut writer, page, &mut failed)?;
        }

        // Pages already dispatched when the limit was hit are still stored.
        while let Some(joined) = inflight.join_next().await {
            persist(&mut writer, joined?, &mut failed)?;
        }

        let corpus = writer.finish()?;
        tracing::info!(
            pages = corpus.len(),
            failed = failed.len(),
            frontier = frontier.len(),
            "crawl complete"
        );
        Ok(CrawlReport { corpus, failed })
    }
}

async fn visit<P: HtmlParser>(fetcher: Arc<dyn PageFetcher>, extractor: Arc<ContentExtractor<P>>, id: PageId) -> Visit {
    let (content, fetch_failed) = match fetcher.fetch(&id).await {
        Ok(body) => (body, false),
        Err(e) => {
            tracing::warn!(page = %id, error = %e, "fetch failed, storing page as empty");
            (String::new(), true)
        }
    };
    let Extracted { text, links } = extractor.extract(&content);
    Visit { record: PageRecord::new(id, text, links), fetch_failed }
}

fn persist(writer: &mut CorpusWriter, page: Visit, failed: &mut Vec<PageId>) -> Result<()> {
    if page.fetch_failed {
        failed.push(page.record.id.clone());
    }
    tracing::debug!(page = %page.record.id, links = page.record.links.len(), stored = writer.len() + 1, "stored page");
    writer.write(page.record)
}
