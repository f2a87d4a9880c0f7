use anyhow::Result;
use axum::Router;
use clap::Parser;
use crawler::fetch::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use server::{build_app, fetcher_config, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus directory; scrapes rebuild it, startup serves what is already there
    #[arg(long, default_value = "./wikipedia")]
    corpus: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3030)]
    port: u16,
    /// Site the article paths are resolved against
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// In-flight fetches per scrape
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
    /// Per-request fetch timeout in seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent sent while scraping
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        corpus_dir: args.corpus.clone(),
        fetcher: fetcher_config(args.base_url.clone(), args.timeout_secs, args.user_agent.clone()),
        concurrency: args.concurrency,
    };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, corpus = %args.corpus.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
