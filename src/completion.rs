//! Remote chat completion client and prompt construction.

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::{DocqaError, Result};

const PLAIN_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Your job is to answer the user's questions.";

/// System prompt used when no retrieval context is supplied.
pub fn plain_system_prompt() -> String {
    PLAIN_SYSTEM_PROMPT.to_string()
}

/// System prompt that grounds the answer in retrieved `context`.
pub fn context_system_prompt(context: &str) -> String {
    format!(
        "Based on the context provided, your job is to first cite the relevant answer found \
         in the context. Explicitly state in which file the answer is found. Then summarize \
         the answer in your own words. Format your answer as markdown so that it can be \
         copied into a .md file. Your context is:\n\n{}",
        context
    )
}

/// Produces a natural-language answer for a system prompt and a question.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    async fn complete(&self, system: &str, question: &str) -> Result<String>;
}

/// [`Completer`] backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAICompleter {
    client: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl OpenAICompleter {
    pub fn new(client: reqwest::Client, api: &ApiConfig, api_key: String) -> Self {
        Self {
            client,
            url: api.completions_url.clone(),
            model: api.completion_model.clone(),
            max_tokens: api.max_tokens,
            api_key,
        }
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, question: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": question},
            ],
            "max_tokens": self.max_tokens,
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
                "completions API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DocqaError::MalformedResponse(e.to_string()))?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
pub fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            DocqaError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}
