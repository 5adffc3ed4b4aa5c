//! Ingestion pipeline orchestration.
//!
//! Coordinates the embed flow: discovery → read → protection check →
//! chunking → embedding → store append. One task per discovered unit runs
//! in a [`JoinSet`], gated by a [`Semaphore`]; every task reports into a
//! single aggregator task through an `mpsc` channel, so the accumulator of
//! new records has exactly one owner. A unit's failure never cancels the
//! others, and the store file is written once, after all tasks joined.
//!
//! A window whose embedding call fails is dropped and the unit continues.
//! A unit fails only when its content cannot be read, it is protected, or
//! none of its windows could be embedded.
//!
//! # Cancellation
//!
//! Raising the [`CancelSignal`] stops scheduling new units. Units still
//! waiting for a permit, and in-flight units at their next window boundary,
//! report [`DocqaError::Cancelled`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::chunk::{split_lines, windows};
use crate::config::{ChunkingConfig, Config, IngestConfig};
use crate::credentials;
use crate::embedding::{self, Embedder, OpenAIEmbedder};
use crate::error::{DocqaError, Result};
use crate::extract;
use crate::models::EmbeddingRecord;
use crate::store;

/// One document to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUnit {
    Url(String),
    File(PathBuf),
}

impl SourceUnit {
    /// Identifier stored in each record's `source_id`.
    pub fn source_id(&self) -> String {
        match self {
            SourceUnit::Url(url) => url.clone(),
            SourceUnit::File(path) => path.display().to_string(),
        }
    }
}

/// Units found under a root, plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub units: Vec<SourceUnit>,
    pub unreadable: Vec<(String, DocqaError)>,
}

/// Result of ingesting one unit.
#[derive(Debug)]
pub enum UnitOutcome {
    Embedded {
        source: String,
        records: usize,
        /// Windows whose embedding call failed.
        dropped: usize,
    },
    Failed {
        source: String,
        error: DocqaError,
    },
}

/// Records of one unit and the number of windows left out.
#[derive(Debug, Default)]
struct UnitRecords {
    records: Vec<EmbeddingRecord>,
    dropped: usize,
}

/// Everything an ingestion run produced.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// New records, grouped per unit in completion order.
    pub records: Vec<EmbeddingRecord>,
    pub outcomes: Vec<UnitOutcome>,
}

impl IngestReport {
    fn absorb(&mut self, source: String, result: Result<UnitRecords>) {
        match result {
            Ok(unit) => {
                self.outcomes.push(UnitOutcome::Embedded {
                    source,
                    records: unit.records.len(),
                    dropped: unit.dropped,
                });
                self.records.extend(unit.records);
            }
            Err(error) => self.outcomes.push(UnitOutcome::Failed { source, error }),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Embedded { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DocqaError)> {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Failed { source, error } => Some((source.as_str(), error)),
            UnitOutcome::Embedded { .. } => None,
        })
    }

    /// Windows dropped across all embedded units.
    pub fn dropped_windows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                UnitOutcome::Embedded { dropped, .. } => *dropped,
                UnitOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Print the per-unit summary shown after `--embed`.
    pub fn print_summary(&self, root: &str) {
        println!("embed {}", root);
        for outcome in &self.outcomes {
            match outcome {
                UnitOutcome::Embedded {
                    source,
                    records,
                    dropped: 0,
                } => println!("  ok      {} ({} windows)", source, records),
                UnitOutcome::Embedded {
                    source,
                    records,
                    dropped,
                } => println!(
                    "  partial {} ({} windows, {} dropped)",
                    source, records, dropped
                ),
                UnitOutcome::Failed { source, error } => {
                    println!("  failed  {}: {}", source, error)
                }
            }
        }
        println!("  units embedded: {}", self.succeeded());
        println!("  units failed: {}", self.failures().count());
        println!("  windows dropped: {}", self.dropped_windows());
        println!("  records added: {}", self.records.len());
    }
}

/// A one-shot cancellation flag shared between the CLI and running tasks.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so wait_for cannot fail here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings and collaborators shared by every unit task.
struct UnitContext {
    embedder: Arc<dyn Embedder>,
    client: reqwest::Client,
    chunking: ChunkingConfig,
    ingest: IngestConfig,
    cancel: CancelSignal,
}

/// Runs ingestion of a path or URL with bounded concurrency.
pub struct Ingestor {
    ctx: Arc<UnitContext>,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        client: reqwest::Client,
        config: &Config,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            ctx: Arc::new(UnitContext {
                embedder,
                client,
                chunking: config.chunking,
                ingest: config.ingest.clone(),
                cancel,
            }),
        }
    }

    /// Ingest every unit under `root` and return the collected records.
    ///
    /// Fails only when `root` itself cannot be resolved; per-unit failures
    /// are recorded in the report.
    pub async fn ingest(&self, root: &str) -> Result<IngestReport> {
        let Discovery { units, unreadable } = discover(root).await?;
        tracing::info!(
            root,
            units = units.len(),
            unreadable = unreadable.len(),
            model = self.ctx.embedder.model_name(),
            "discovered documents"
        );

        let max_concurrency = self.ctx.ingest.max_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let (tx, mut rx) = mpsc::channel::<(String, Result<UnitRecords>)>(max_concurrency * 2);

        let aggregator = tokio::spawn(async move {
            let mut report = IngestReport::default();
            while let Some((source, result)) = rx.recv().await {
                report.absorb(source, result);
            }
            report
        });

        for (source, error) in unreadable {
            let _ = tx.send((source, Err(error))).await;
        }

        let mut tasks = JoinSet::new();
        for unit in units {
            let source = unit.source_id();
            let cancel = &self.ctx.cancel;

            let permit = if cancel.is_cancelled() {
                None
            } else {
                tokio::select! {
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                    _ = cancel.cancelled() => None,
                }
            };
            let Some(permit) = permit else {
                let _ = tx.send((source, Err(DocqaError::Cancelled))).await;
                continue;
            };

            let ctx = Arc::clone(&self.ctx);
            let tx = tx.clone();
            tasks.spawn(async move {
                // A panic inside the unit surfaces as a join error and is
                // reported as that unit's failure.
                let worker = tokio::spawn(async move { process_unit(&ctx, &unit).await });
                let result = worker
                    .await
                    .unwrap_or_else(|e| Err(DocqaError::TaskFailed(e.to_string())));
                drop(permit);
                match &result {
                    Ok(unit) => tracing::info!(
                        source = %source,
                        windows = unit.records.len(),
                        dropped = unit.dropped,
                        "embedded"
                    ),
                    Err(e) => tracing::warn!(source = %source, error = %e, "skipped"),
                }
                let _ = tx.send((source, result)).await;
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "ingestion task failed");
            }
        }

        aggregator
            .await
            .map_err(|e| DocqaError::TaskFailed(e.to_string()))
    }
}

/// Read, check, chunk and embed one unit. Windows are embedded in order.
async fn process_unit(ctx: &UnitContext, unit: &SourceUnit) -> Result<UnitRecords> {
    let source = unit.source_id();
    let content = match unit {
        SourceUnit::Url(url) => extract::fetch_url(&ctx.client, url).await?,
        SourceUnit::File(path) => {
            let path = path.clone();
            let exts = ctx.ingest.text_extensions.clone();
            tokio::task::spawn_blocking(move || extract::read_file(&path, &exts))
                .await
                .map_err(|e| DocqaError::TaskFailed(e.to_string()))??
        }
    };

    if content.contains(&ctx.ingest.protection_marker) {
        return Err(DocqaError::ProtectedDocument { source_id: source });
    }

    let lines = split_lines(&content);
    let mut unit_records = UnitRecords::default();
    let mut last_error = None;
    for window in windows(&lines, ctx.chunking) {
        if ctx.cancel.is_cancelled() {
            return Err(DocqaError::Cancelled);
        }
        tracing::debug!(source = %source, start = window.start, end = window.end, "embedding window");
        match ctx.embedder.embed(&window.text).await {
            Ok(vector) => unit_records
                .records
                .push(EmbeddingRecord::new(&source, window, vector)),
            Err(e) => {
                tracing::warn!(
                    source = %source,
                    start = window.start,
                    end = window.end,
                    error = %e,
                    "dropping window"
                );
                unit_records.dropped += 1;
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if unit_records.records.is_empty() => Err(e),
        _ => Ok(unit_records),
    }
}

/// Resolve `root` into ingestion units.
///
/// A URL or regular file is one unit; a directory yields one unit per
/// regular file beneath it, in file-name order. Symlinks and special files
/// are skipped; entries that cannot be read are collected as failures. A root
/// that does not exist is an error.
pub async fn discover(root: &str) -> Result<Discovery> {
    if extract::is_url(root) {
        return Ok(Discovery {
            units: vec![SourceUnit::Url(root.to_string())],
            unreadable: Vec::new(),
        });
    }
    let root = PathBuf::from(root);
    tokio::task::spawn_blocking(move || discover_local(&root))
        .await
        .map_err(|e| DocqaError::TaskFailed(e.to_string()))?
}

fn discover_local(root: &Path) -> Result<Discovery> {
    let metadata = std::fs::metadata(root)?;
    let mut discovery = Discovery::default();
    if metadata.is_file() {
        discovery.units.push(SourceUnit::File(root.to_path_buf()));
        return Ok(discovery);
    }
    if !metadata.is_dir() {
        return Ok(discovery);
    }

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                discovery.units.push(SourceUnit::File(entry.into_path()));
            }
            Ok(_) => {}
            Err(e) => {
                let source = e
                    .path()
                    .unwrap_or(root)
                    .display()
                    .to_string();
                tracing::warn!(source = %source, error = %e, "could not read directory entry");
                discovery.unreadable.push((source, DocqaError::Io(e.into())));
            }
        }
    }
    Ok(discovery)
}

/// Load the store, ingest `root`, append the new records and save.
///
/// The store is saved even when some units failed. It is not saved when the
/// new records disagree with the stored vectors' dimensionality, since every
/// later query would fail on such a store.
pub async fn ingest_and_save(
    ingestor: &Ingestor,
    store_path: &Path,
    root: &str,
) -> anyhow::Result<IngestReport> {
    let report = ingestor
        .ingest(root)
        .await
        .with_context(|| format!("Failed to ingest {}", root))?;

    tracing::info!(path = %store_path.display(), "loading previous embeddings");
    let existing = store::load(store_path);
    let merged = store::append(existing, report.records.clone());
    if let Err(e) = store::dimensions(&merged) {
        bail!("Refusing to save {}: {}", store_path.display(), e);
    }

    store::save(store_path, &merged)
        .with_context(|| format!("Failed to save store: {}", store_path.display()))?;
    tracing::info!(records = merged.len(), "store saved");
    Ok(report)
}

/// `docqa --embed <path>`: ingest with the configured remote embedder.
pub async fn run_ingest(config: &Config, root: &str, cancel: CancelSignal) -> anyhow::Result<()> {
    let api_key = credentials::load_key(&config.credentials.path)?;
    let client = embedding::build_client(&config.api)?;
    let embedder: Arc<dyn Embedder> =
        Arc::new(OpenAIEmbedder::new(client.clone(), &config.api, api_key));
    let ingestor = Ingestor::new(embedder, client, config, cancel);

    let report = ingest_and_save(&ingestor, &config.paths.store, root).await?;
    report.print_summary(root);
    println!("  store: {}", config.paths.store.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cancel_signal_is_shared() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_cancelled());
        signal.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        signal.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_discover_url_is_single_unit() {
        let units = discover("https://example.com/guide.pdf").await.unwrap().units;
        assert_eq!(
            units,
            vec![SourceUnit::Url("https://example.com/guide.pdf".to_string())]
        );
    }

    #[tokio::test]
    async fn test_discover_directory_in_name_order() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join("sub").join("c.md"), "c").unwrap();

        let units = discover(tmp.path().to_str().unwrap()).await.unwrap().units;
        let names: Vec<String> = units
            .iter()
            .map(|u| match u {
                SourceUnit::File(p) => p.file_name().unwrap().to_string_lossy().into_owned(),
                SourceUnit::Url(u) => u.clone(),
            })
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.md"]);
    }

    #[tokio::test]
    async fn test_discover_single_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("only.md");
        fs::write(&file, "x").unwrap();
        let units = discover(file.to_str().unwrap()).await.unwrap().units;
        assert_eq!(units, vec![SourceUnit::File(file)]);
    }

    #[test]
    fn test_report_counts() {
        let mut report = IngestReport::default();
        report.absorb(
            "a".to_string(),
            Ok(UnitRecords {
                records: Vec::new(),
                dropped: 2,
            }),
        );
        report.absorb("b".to_string(), Err(DocqaError::Cancelled));
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.dropped_windows(), 2);
    }
}
