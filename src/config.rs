//! TOML configuration.
//!
//! Every section and field has a default, so an absent config file yields a
//! working setup rooted in the user's home directory:
//!
//! ```toml
//! [paths]
//! store = "~/.docqa/embeddings.json"
//! answer = "~/answer.md"
//!
//! [credentials]
//! path = "~/.docqa/api_key"
//!
//! [api]
//! embedding_model = "text-embedding-ada-002"
//! completion_model = "gpt-3.5-turbo"
//!
//! [chunking]
//! stride = 200
//! left_pad = 50
//! reach = 250
//!
//! [retrieval]
//! top_n = 2
//!
//! [ingest]
//! max_concurrency = 4
//! protection_marker = "#protected"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_store_path")]
    pub store: PathBuf,
    #[serde(default = "default_answer_path")]
    pub answer: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store: default_store_path(),
            answer: default_answer_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_embeddings_url")]
    pub embeddings_url: String,
    #[serde(default = "default_completions_url")]
    pub completions_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            embeddings_url: default_embeddings_url(),
            completions_url: default_completions_url(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Line-window parameters for the chunker.
///
/// Windows start every `stride` lines, reach back `left_pad` lines and
/// forward `reach` lines from the stride point.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    #[serde(default = "default_stride")]
    pub stride: usize,
    #[serde(default = "default_left_pad")]
    pub left_pad: usize,
    #[serde(default = "default_reach")]
    pub reach: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            left_pad: default_left_pad(),
            reach: default_reach(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_protection_marker")]
    pub protection_marker: String,
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            protection_marker: default_protection_marker(),
            text_extensions: default_text_extensions(),
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding the store, credential and config files by default.
pub fn data_dir() -> PathBuf {
    home_dir().join(".docqa")
}

/// Location of the config file when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

fn default_store_path() -> PathBuf {
    data_dir().join("embeddings.json")
}
fn default_answer_path() -> PathBuf {
    home_dir().join("answer.md")
}
fn default_credentials_path() -> PathBuf {
    data_dir().join("api_key")
}
fn default_embeddings_url() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}
fn default_completions_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_stride() -> usize {
    200
}
fn default_left_pad() -> usize {
    50
}
fn default_reach() -> usize {
    250
}
fn default_top_n() -> usize {
    2
}
fn default_max_concurrency() -> usize {
    4
}
fn default_protection_marker() -> String {
    "#protected".to_string()
}
fn default_text_extensions() -> Vec<String> {
    [
        "txt", "md", "markdown", "rst", "csv", "json", "toml", "yaml", "yml", "html", "xml",
        "log", "rs", "go", "py", "js", "ts", "java", "c", "h", "cpp", "sh",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

/// Load and validate the config at `path`.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.paths.store = expand_home(&config.paths.store);
    config.paths.answer = expand_home(&config.paths.answer);
    config.credentials.path = expand_home(&config.credentials.path);

    validate(&config)?;
    Ok(config)
}

/// Replace a leading `~` with the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.stride == 0 {
        bail!("chunking.stride must be > 0");
    }
    if config.chunking.reach < config.chunking.stride {
        bail!(
            "chunking.reach ({}) must be >= chunking.stride ({}) or windows leave gaps",
            config.chunking.reach,
            config.chunking.stride
        );
    }
    if config.retrieval.top_n == 0 {
        bail!("retrieval.top_n must be >= 1");
    }
    if config.ingest.max_concurrency == 0 {
        bail!("ingest.max_concurrency must be >= 1");
    }
    if config.ingest.protection_marker.is_empty() {
        bail!("ingest.protection_marker must not be empty");
    }
    if config.api.timeout_secs == 0 {
        bail!("api.timeout_secs must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tilde_paths_are_expanded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(&path, "[paths]\nstore = \"~/.docqa/store.json\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert!(!cfg.paths.store.starts_with("~"));
        assert!(cfg.paths.store.ends_with(".docqa/store.json"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.chunking, ChunkingConfig::default());
        assert_eq!(cfg.retrieval.top_n, 2);
        assert_eq!(cfg.ingest.protection_marker, "#protected");
        assert_eq!(cfg.api.completion_model, "gpt-3.5-turbo");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(
            &path,
            "[paths]\nstore = \"/tmp/store.json\"\n\n[ingest]\nmax_concurrency = 8\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.paths.store, PathBuf::from("/tmp/store.json"));
        assert_eq!(cfg.ingest.max_concurrency, 8);
        assert_eq!(cfg.ingest.protection_marker, "#protected");
        assert_eq!(cfg.chunking.stride, 200);
    }

    #[test]
    fn rejects_zero_stride() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(&path, "[chunking]\nstride = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn rejects_reach_shorter_than_stride() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(&path, "[chunking]\nstride = 100\nreach = 50\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(&path, "[ingest]\nmax_concurrency = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        std::fs::write(&path, "[paths\nstore = ").unwrap();
        assert!(load_config(&path).is_err());
    }
}
