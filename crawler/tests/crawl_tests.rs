use async_trait::async_trait;
use crawler::{ContentExtractor, Crawler, FetchError, FetcherConfig, HttpFetcher, PageFetcher, ScraperParser};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use wikisearch_core::{CorpusStore, PageId};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article(text: &str, links: &[&str]) -> String {
    let anchors: String = links.iter().map(|l| format!(r#" <a href="{l}">link</a>"#)).collect();
    format!(r#"<html><body><div id="mw-content-text"><p>{text}{anchors}</p></div></body></html>"#)
}

/// Serves canned pages and records the order of requests. Unknown pages fail;
/// hanging pages never answer.
#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
    hanging: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MapFetcher {
    fn with(mut self, id: &str, text: &str, links: &[&str]) -> Self {
        self.pages.insert(id.to_string(), article(text, links));
        self
    }

    fn hang_on(mut self, id: &str) -> Self {
        self.hanging.insert(id.to_string());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, id: &PageId) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(id.to_string());
        tokio::task::yield_now().await;
        if self.hanging.contains(id.as_str()) {
            std::future::pending::<()>().await;
        }
        match self.pages.get(id.as_str()) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status { url: format!("http://test{id}").parse().unwrap(), status: 404 }),
        }
    }
}

fn crawler_for(fetcher: Arc<MapFetcher>, root: &Path) -> Crawler {
    Crawler::new(fetcher, ContentExtractor::new(ScraperParser), CorpusStore::new(root))
}

fn tree() -> MapFetcher {
    MapFetcher::default()
        .with("/wiki/A", "alpha", &["/wiki/B", "/wiki/C"])
        .with("/wiki/B", "bravo", &["/wiki/D", "/wiki/A"])
        .with("/wiki/C", "charlie", &["/wiki/E"])
        .with("/wiki/D", "delta", &[])
        .with("/wiki/E", "echo", &["/wiki/A"])
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn single_page_crawl_stores_only_the_seed() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(tree());
    let report = crawler_for(fetcher.clone(), dir.path()).crawl(&"/wiki/A".into(), 1).await.unwrap();

    assert_eq!(report.corpus.len(), 1);
    assert_eq!(fetcher.requests(), vec!["/wiki/A"]);
    assert_eq!(file_count(&dir.path().join("Words")), 1);
    assert_eq!(file_count(&dir.path().join("Links")), 1);
    assert_eq!(fs::read_to_string(dir.path().join("Words/A")).unwrap(), "alpha link link");
    assert_eq!(fs::read_to_string(dir.path().join("Links/A")).unwrap(), "/wiki/B\n/wiki/C");
}

#[tokio::test]
async fn visits_breadth_first() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(tree());
    let report = crawler_for(fetcher.clone(), dir.path()).crawl(&"/wiki/A".into(), 4).await.unwrap();

    assert_eq!(fetcher.requests(), vec!["/wiki/A", "/wiki/B", "/wiki/C", "/wiki/D"]);
    assert_eq!(report.corpus.len(), 4);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn exhausted_graph_ends_early() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(tree());
    let report = crawler_for(fetcher.clone(), dir.path()).crawl(&"/wiki/A".into(), 50).await.unwrap();

    assert_eq!(report.corpus.len(), 5);
    // Cycles back to A are never fetched twice.
    let requests = fetcher.requests();
    let unique: HashSet<_> = requests.iter().collect();
    assert_eq!(unique.len(), requests.len());
}

#[tokio::test]
async fn failed_fetches_are_stored_empty_and_crawl_continues() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(
        MapFetcher::default()
            .with("/wiki/A", "alpha", &["/wiki/Gone", "/wiki/B"])
            .with("/wiki/B", "bravo", &[]),
    );
    let report = crawler_for(fetcher, dir.path()).crawl(&"/wiki/A".into(), 10).await.unwrap();

    assert_eq!(report.corpus.len(), 3);
    assert_eq!(report.failed, vec![PageId::from("/wiki/Gone")]);
    let gone = report.corpus.get(&"/wiki/Gone".into()).unwrap();
    assert_eq!(gone.text, "");
    assert!(gone.links.is_empty());
    assert_eq!(fs::read_to_string(dir.path().join("Words/Gone")).unwrap(), "");
}

#[tokio::test]
async fn concurrent_crawl_respects_limit_without_duplicates() {
    let mut fetcher = MapFetcher::default();
    for i in 0..30 {
        let links: Vec<String> = (0..30).map(|j| format!("/wiki/P{}", (i * 7 + j) % 30)).collect();
        let links: Vec<&str> = links.iter().map(String::as_str).collect();
        fetcher = fetcher.with(&format!("/wiki/P{i}"), "page", &links);
    }
    let fetcher = Arc::new(fetcher);
    let dir = tempdir().unwrap();
    let crawler = crawler_for(fetcher.clone(), dir.path()).with_concurrency(8);
    let report = crawler.crawl(&"/wiki/P0".into(), 12).await.unwrap();

    assert_eq!(report.corpus.len(), 12);
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 12);
    assert_eq!(requests.iter().collect::<HashSet<_>>().len(), 12);
    assert_eq!(file_count(&dir.path().join("Words")), 12);
}

#[tokio::test]
async fn new_crawl_replaces_previous_generation() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(tree());
    let crawler = crawler_for(fetcher, dir.path());
    crawler.crawl(&"/wiki/A".into(), 5).await.unwrap();
    crawler.crawl(&"/wiki/D".into(), 5).await.unwrap();

    let corpus = crawler.store().load().unwrap();
    assert_eq!(corpus.len(), 1);
    assert!(corpus.get(&"/wiki/D".into()).is_some());
    assert_eq!(file_count(&dir.path().join("Links")), 1);
}

#[tokio::test]
async fn cancelled_crawl_leaves_nothing_loadable() {
    let dir = tempdir().unwrap();
    crawler_for(Arc::new(tree()), dir.path()).crawl(&"/wiki/A".into(), 3).await.unwrap();
    assert_eq!(CorpusStore::new(dir.path()).load().unwrap().len(), 3);

    let crawler = crawler_for(Arc::new(tree().hang_on("/wiki/B")), dir.path());
    let outcome = tokio::time::timeout(Duration::from_millis(200), crawler.crawl(&"/wiki/A".into(), 5)).await;
    assert!(outcome.is_err());

    // The seed was rewritten before the crawl stalled, but no manifest exists.
    assert!(dir.path().join("Words/A").exists());
    assert!(!dir.path().join("manifest.json").exists());
    assert!(crawler.store().load().unwrap().is_empty());
}

#[tokio::test]
async fn zero_pages_is_rejected() {
    let dir = tempdir().unwrap();
    let crawler = crawler_for(Arc::new(tree()), dir.path());
    assert!(crawler.crawl(&"/wiki/A".into(), 0).await.is_err());
}

#[tokio::test]
async fn crawls_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Cat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article("A cat sat on a mat.", &["/wiki/Mat", "/wiki/Talk:Cat"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Mat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetcherConfig { base_url: server.uri(), timeout: Duration::from_secs(2), ..Default::default() }).unwrap();
    let dir = tempdir().unwrap();
    let crawler = Crawler::new(Arc::new(fetcher), ContentExtractor::new(ScraperParser), CorpusStore::new(dir.path()));
    let report = crawler.crawl(&PageId::from_phrase("cat"), 5).await.unwrap();

    let cat = report.corpus.get(&"/wiki/Cat".into()).unwrap();
    assert_eq!(cat.text, "a cat sat on a mat link link");
    assert_eq!(cat.links, vec![PageId::from("/wiki/Mat")]);
    assert_eq!(report.failed, vec![PageId::from("/wiki/Mat")]);
    assert_eq!(report.corpus.len(), 2);
}
