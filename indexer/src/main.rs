use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};
use wikisearch_core::persist::{load_index, load_meta, save_index, save_meta, IndexPaths, MetaFile, SNAPSHOT_VERSION};
use wikisearch_core::{build_index, normalize_query, rank, CorpusStore, InvertedIndex, SearchResult};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build positional index snapshots from a crawled corpus and query them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index snapshot from a corpus directory
    Build {
        /// Corpus directory written by the crawler
        #[arg(long, default_value = "./wikipedia")]
        corpus: String,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: String,
    },
    /// Run a ranked query against a snapshot, or against a corpus directly
    Query {
        /// Index snapshot directory
        #[arg(long, conflicts_with = "corpus")]
        index: Option<String>,
        /// Corpus directory to index on the fly
        #[arg(long)]
        corpus: Option<String>,
        /// Query text
        #[arg(long)]
        q: String,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
}

#[derive(Serialize)]
struct QueryOutput {
    query: String,
    took_s: f64,
    total_hits: usize,
    results: Vec<SearchResult>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, output } => {
            build_snapshot(&corpus, &output)?;
        }
        Commands::Query { index, corpus, q, k } => {
            let index = match (index, corpus) {
                (Some(dir), _) => load_snapshot(&dir)?,
                (None, Some(dir)) => build_index(&CorpusStore::new(dir).load()?),
                (None, None) => bail!("either --index or --corpus is required"),
            };
            let out = run_query(&index, &q, k)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn build_snapshot(corpus_dir: &str, output: &str) -> Result<MetaFile> {
    let corpus = CorpusStore::new(corpus_dir).load()?;
    if corpus.is_empty() {
        tracing::warn!(corpus_dir, "corpus is empty, snapshot will match nothing");
    }
    let index = build_index(&corpus);
    tracing::info!(pages = index.num_pages(), terms = index.num_terms(), "indexed corpus");

    let paths = IndexPaths::new(output);
    save_index(&paths, &index)?;
    let meta = MetaFile {
        num_pages: index.num_pages() as u32,
        num_terms: index.num_terms() as u32,
        corpus_created_at: corpus.created_at().map(str::to_string),
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
        version: SNAPSHOT_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(meta)
}

fn load_snapshot(dir: &str) -> Result<InvertedIndex> {
    let paths = IndexPaths::new(dir);
    if !paths.exists() {
        bail!("no index snapshot in {}", Path::new(dir).display());
    }
    let meta = load_meta(&paths)?;
    let index = load_index(&paths)?;
    tracing::info!(pages = meta.num_pages, terms = meta.num_terms, created_at = %meta.created_at, "loaded snapshot");
    Ok(index)
}

fn run_query(index: &InvertedIndex, q: &str, k: usize) -> Result<QueryOutput> {
    let start = std::time::Instant::now();
    let query = normalize_query(q)?;
    let mut results = rank(&query, index);
    let total_hits = results.len();
    results.truncate(k.max(1));
    Ok(QueryOutput { query, took_s: start.elapsed().as_secs_f64(), total_hits, results })
}
