//! Remote embedding client.
//!
//! Defines the [`Embedder`] trait consumed by ingestion and query answering,
//! and [`OpenAIEmbedder`], which calls an OpenAI-compatible
//! `POST /v1/embeddings` endpoint.
//!
//! # Failure policy
//!
//! There is no retry. Transport failures and non-success HTTP statuses are
//! [`DocqaError::Network`]; a response without `data[0].embedding` is
//! [`DocqaError::MalformedResponse`]. During ingestion either one drops
//! only the window being embedded; during a query it fails the query.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::{DocqaError, Result};

/// Turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Build the HTTP client shared by the remote collaborators.
pub fn build_client(api: &ApiConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()?)
}

/// [`Embedder`] backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAIEmbedder {
    pub fn new(client: reqwest::Client, api: &ApiConfig, api_key: String) -> Self {
        Self {
            client,
            url: api.embeddings_url.clone(),
            model: api.embedding_model.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(DocqaError::Network(format!(
                "embeddings API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DocqaError::MalformedResponse(e.to_string()))?;
        parse_embedding_response(&json)
    }
}

/// Extract `data[0].embedding` from an embeddings API response.
pub fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f64>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            DocqaError::MalformedResponse("missing data[0].embedding".to_string())
        })?;

    embedding
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                DocqaError::MalformedResponse(format!("non-numeric embedding component: {}", v))
            })
        })
        .collect()
}
