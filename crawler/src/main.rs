use anyhow::{anyhow, Result};
use clap::Parser;
use crawler::fetch::{FetcherConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crawler::{ContentExtractor, Crawler, HttpFetcher, ScraperParser};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};
use wikisearch_core::{CorpusStore, PageId};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl Wikipedia breadth-first from a start page into a corpus directory")]
struct Cli {
    /// Start page: a phrase such as "alan turing" or an article path like /wiki/Alan_Turing
    #[arg(long)]
    start_page: String,
    /// Maximum number of pages to visit
    #[arg(long, default_value_t = 100)]
    max_pages: usize,
    /// Corpus directory (Words/ and Links/ are recreated on every run)
    #[arg(long, default_value = "./wikipedia")]
    output: String,
    /// Site the article paths are resolved against
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Concurrency (number of in-flight fetches)
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    seed: &'a str,
    pages: usize,
    failed: Vec<&'a str>,
    output: &'a str,
    took_s: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    if args.start_page.trim().is_empty() || args.max_pages == 0 {
        return Err(anyhow!("start page and a positive page count are required"));
    }

    let fetcher = HttpFetcher::new(&FetcherConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        user_agent: args.user_agent.clone(),
    })?;
    let crawler = Crawler::new(Arc::new(fetcher), ContentExtractor::new(ScraperParser), CorpusStore::new(&args.output))
        .with_concurrency(args.concurrency);

    let seed = PageId::from_phrase(&args.start_page);
    let start = Instant::now();
    let report = crawler.crawl(&seed, args.max_pages).await?;

    let summary = Summary {
        seed: seed.as_str(),
        pages: report.corpus.len(),
        failed: report.failed.iter().map(PageId::as_str).collect(),
        output: &args.output,
        took_s: start.elapsed().as_secs_f64(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
