use anyhow::{Context, Result};

use crate::config::Config;
use crate::store;

/// `docqa --list`: print the ingested sources and their window counts.
pub fn list_sources(config: &Config) -> Result<()> {
    let store = store::load(&config.paths.store);
    if store.is_empty() {
        println!("No embeddings stored in {}.", config.paths.store.display());
        return Ok(());
    }

    let dims = store::dimensions(&store)
        .with_context(|| format!("Inconsistent store: {}", config.paths.store.display()))?
        .unwrap_or(0);

    println!("{:<8} SOURCE", "WINDOWS");
    for (source, count) in store::sources(&store) {
        println!("{:<8} {}", count, source);
    }
    println!();
    println!("records: {}", store.len());
    println!("dimensions: {}", dims);
    println!("created: {}", store.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

    Ok(())
}
