//! Document reading: remote URLs, PDFs and plain-text files.
//!
//! URL content is always treated as plain text, whatever the URL's suffix.
//! Local files are classified by extension: `pdf` goes through
//! `pdf-extract`, configured text extensions (and extension-less files) are
//! read as UTF-8, anything else is [`DocqaError::UnsupportedFileType`].

use std::path::Path;

use crate::error::{DocqaError, Result};

const PDF_EXTENSION: &str = "pdf";

/// Whether `source` names a remote document rather than a local path.
pub fn is_url(source: &str) -> bool {
    source.starts_with("https://") || source.starts_with("http://")
}

/// How a local file will be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Text,
}

/// Classify `path` by its extension.
pub fn classify(path: &Path, text_extensions: &[String]) -> Result<FileKind> {
    let Some(ext) = path.extension() else {
        return Ok(FileKind::Text);
    };
    let ext = ext.to_string_lossy().to_ascii_lowercase();
    if ext == PDF_EXTENSION {
        return Ok(FileKind::Pdf);
    }
    if text_extensions.iter().any(|t| t.eq_ignore_ascii_case(&ext)) {
        return Ok(FileKind::Text);
    }
    Err(DocqaError::UnsupportedFileType {
        path: path.to_path_buf(),
    })
}

/// Read a local file into text. Blocking; PDF extraction is CPU-bound.
pub fn read_file(path: &Path, text_extensions: &[String]) -> Result<String> {
    let kind = classify(path, text_extensions)?;
    let bytes = std::fs::read(path)?;
    match kind {
        FileKind::Pdf => extract_pdf(path, &bytes),
        FileKind::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

fn extract_pdf(path: &Path, bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocqaError::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Fetch a remote document as plain text.
pub async fn fetch_url(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DocqaError::Network(format!("GET {} returned {}", url, status)));
    }
    Ok(response.text().await?)
}
