//! # docqa CLI
//!
//! ## Usage
//!
//! ```bash
//! docqa --key sk-...                  # store the API key
//! docqa --embed ./notes               # ingest a file, directory or URL
//! docqa "How do I rotate the keys?"   # answer from the stored embeddings
//! docqa --list                        # show what has been ingested
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `docqa=info`).

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::ingest::CancelSignal;
use docqa::{answer, config, credentials, ingest, sources};

/// docqa: ask questions over your documents with embedding retrieval.
///
/// With `--embed` the given file, directory or URL is ingested; with `--key`
/// the API key is stored; otherwise the argument is a question.
#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults to `~/.docqa/config.toml`;
    /// built-in defaults are used when the file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Embed a file, a directory (recursively) or an http(s) URL.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["key", "list"])]
    embed: Option<String>,

    /// Store an API key for the remote model API.
    #[arg(long, value_name = "KEY", conflicts_with = "list")]
    key: Option<String>,

    /// List ingested sources.
    #[arg(long)]
    list: bool,

    /// Number of nearest windows to put into the prompt context.
    #[arg(long, value_name = "N")]
    top_n: Option<usize>,

    /// Ask the model directly, without retrieval context.
    #[arg(long)]
    no_context: bool,

    /// The question to answer.
    question: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(&config_path)?;

    if let Some(root) = cli.embed {
        let cancel = CancelSignal::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, finishing in-flight documents");
                on_interrupt.cancel();
            }
        });
        ingest::run_ingest(&cfg, &root, cancel).await?;
    } else if let Some(key) = cli.key {
        credentials::store_key(&cfg.credentials.path, &key)?;
        println!("API key stored in {}", cfg.credentials.path.display());
    } else if cli.list {
        sources::list_sources(&cfg)?;
    } else if let Some(question) = cli.question {
        answer::run_ask(&cfg, &question, cli.top_n, cli.no_context).await?;
    } else {
        anyhow::bail!("Nothing to do: pass a question, --embed <PATH>, --key <KEY> or --list");
    }

    Ok(())
}
