//! Error taxonomy for the ingestion and retrieval pipeline.
//!
//! Library code returns [`DocqaError`]; the CLI wraps it in `anyhow` with
//! additional context at the boundary.

use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, DocqaError>;

/// Errors produced by the pipeline components.
///
/// Ingestion isolates these per unit: a failed file is reported and the rest
/// of the batch continues. During query answering any of them is fatal to the
/// query.
#[derive(Debug, thiserror::Error)]
pub enum DocqaError {
    /// A remote call (embedding, completion, URL fetch) failed.
    #[error("network error: {0}")]
    Network(String),

    /// The remote response did not have the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The document contains the protection marker and was not embedded.
    #[error("document is protected: {source_id}")]
    ProtectedDocument { source_id: String },

    /// The file extension is not one the reader knows how to extract.
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFileType { path: PathBuf },

    /// Two vectors of different length were compared.
    #[error("embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Fewer ranked matches exist than were requested.
    #[error("insufficient data: requested {requested} matches but only {available} available")]
    InsufficientData { requested: usize, available: usize },

    /// Text could not be extracted from a document (e.g. a broken PDF).
    #[error("text extraction failed for {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// No API key is stored and none is provided by the environment.
    #[error("no API key found at {}; store one with `docqa --key <KEY>`", path.display())]
    MissingCredential { path: PathBuf },

    /// The operation was stopped by the cancellation signal.
    #[error("cancelled")]
    Cancelled,

    /// The task processing a unit panicked or was aborted.
    #[error("ingestion task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DocqaError {
    fn from(err: reqwest::Error) -> Self {
        DocqaError::Network(err.to_string())
    }
}
