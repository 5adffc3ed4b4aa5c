//! JSON-file embedding store.
//!
//! The whole store is one serialized [`EmbeddingStore`] blob. It is loaded
//! wholesale at startup and rewritten wholesale on save; there is no
//! incremental update and no locking, so only one process may write at a
//! time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{DocqaError, Result};
use crate::models::{EmbeddingRecord, EmbeddingStore};

/// Load the store at `path`.
///
/// Never fails: a missing or unparsable file yields an empty store so that
/// ingestion can proceed and later overwrite it.
pub fn load(path: &Path) -> EmbeddingStore {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "could not read store, starting empty");
            }
            return EmbeddingStore::empty();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store is not valid JSON, starting empty");
            EmbeddingStore::empty()
        }
    }
}

/// Serialize `store` and atomically replace the file at `path`.
///
/// The blob is written to a sibling temp file first and renamed over the
/// target, so a crash never leaves a truncated store behind.
pub fn save(path: &Path, store: &EmbeddingStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec(store)
        .map_err(|e| DocqaError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Return a new store with `new_records` after the existing ones.
///
/// No deduplication: re-ingesting a document duplicates its records.
pub fn append(store: EmbeddingStore, new_records: Vec<EmbeddingRecord>) -> EmbeddingStore {
    let mut records = store.records;
    records.extend(new_records);
    EmbeddingStore {
        created_at: store.created_at,
        records,
    }
}

/// Common vector length of all records, `None` for an empty store.
pub fn dimensions(store: &EmbeddingStore) -> Result<Option<usize>> {
    let mut records = store.records.iter();
    let Some(first) = records.next() else {
        return Ok(None);
    };
    let expected = first.vector.len();
    for record in records {
        if record.vector.len() != expected {
            return Err(DocqaError::DimensionMismatch {
                expected,
                found: record.vector.len(),
            });
        }
    }
    Ok(Some(expected))
}

/// Distinct source ids with their record counts, in first-seen order.
pub fn sources(store: &EmbeddingStore) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &store.records {
        let count = counts.entry(record.source_id.as_str()).or_insert(0);
        if *count == 0 {
            order.push(record.source_id.clone());
        }
        *count += 1;
    }
    order
        .into_iter()
        .map(|source| {
            let count = counts.get(source.as_str()).copied().unwrap_or(0);
            (source, count)
        })
        .collect()
}
