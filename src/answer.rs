//! Query answering: embed the question, rank the store, compose a prompt,
//! call the completion model and write the markdown answer file.
//!
//! Every failure here is fatal to the query. Nothing is written until the
//! completion has succeeded.

use std::path::Path;

use anyhow::Context;

use crate::completion::{self, Completer, OpenAICompleter};
use crate::config::Config;
use crate::credentials;
use crate::embedding::{self, Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::models::{EmbeddingStore, RankedMatch};
use crate::search;
use crate::store;

/// A composed answer plus the matches it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub model: String,
    pub text: String,
    /// Context matches, best first. Empty for context-free answers.
    pub matches: Vec<RankedMatch>,
}

impl Answer {
    /// The match used for source attribution.
    pub fn best_match(&self) -> Option<&RankedMatch> {
        self.matches.first()
    }
}

/// Answer `question` from the `top_n` nearest windows in `store`.
pub async fn answer_question(
    embedder: &dyn Embedder,
    completer: &dyn Completer,
    store: &EmbeddingStore,
    question: &str,
    top_n: usize,
) -> Result<Answer> {
    let query = embedder.embed(question).await?;
    let ranked = search::rank(&query, &store.records)?;
    let matches = search::top_n(&ranked, top_n)?.to_vec();
    tracing::debug!(
        matches = matches.len(),
        best_distance = matches.first().map(|m| m.distance),
        "ranked store"
    );

    let context = search::build_context(&matches);
    let text = completer
        .complete(&completion::context_system_prompt(&context), question)
        .await?;

    Ok(Answer {
        model: completer.model_name().to_string(),
        text,
        matches,
    })
}

/// Answer `question` without retrieval.
pub async fn answer_without_context(completer: &dyn Completer, question: &str) -> Result<Answer> {
    let text = completer
        .complete(&completion::plain_system_prompt(), question)
        .await?;
    Ok(Answer {
        model: completer.model_name().to_string(),
        text,
        matches: Vec::new(),
    })
}

/// Render the markdown answer file.
pub fn render_answer(answer: &Answer) -> String {
    let mut out = format!("# Answer from {}\n\n{}\n", answer.model, answer.text);
    if let Some(best) = answer.best_match() {
        out.push_str(&format!(
            "\n# Matched Context:\nFile: {}\nRow Start: {}\nRow End: {}\n\n{}\n",
            best.record.source_id, best.record.range_start, best.record.range_end, best.record.text
        ));
    }
    out
}

/// Write the rendered answer to `path` via a temp file and rename.
pub fn write_answer(path: &Path, answer: &Answer) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("md.tmp");
    std::fs::write(&tmp, render_answer(answer))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// `docqa <question>`: answer from the store and write the answer file.
pub async fn run_ask(
    config: &Config,
    question: &str,
    top_n: Option<usize>,
    no_context: bool,
) -> anyhow::Result<()> {
    let api_key = credentials::load_key(&config.credentials.path)?;
    let client = embedding::build_client(&config.api)?;
    let completer = OpenAICompleter::new(client.clone(), &config.api, api_key.clone());

    let answer = if no_context {
        answer_without_context(&completer, question).await?
    } else {
        let embedder = OpenAIEmbedder::new(client, &config.api, api_key);
        let store = store::load(&config.paths.store);
        let top_n = top_n.unwrap_or(config.retrieval.top_n);
        answer_question(&embedder, &completer, &store, question, top_n)
            .await
            .with_context(|| {
                format!(
                    "Failed to answer from {} ({} stored windows)",
                    config.paths.store.display(),
                    store.len()
                )
            })?
    };

    println!("Answer from {}\n\n{}", answer.model, answer.text);
    if let Some(best) = answer.best_match() {
        println!(
            "\nSource: {} (rows {}-{})",
            best.record.source_id, best.record.range_start, best.record.range_end
        );
    }

    write_answer(&config.paths.answer, &answer)
        .with_context(|| format!("Failed to write answer: {}", config.paths.answer.display()))?;
    println!("\nAnswer written to {}", config.paths.answer.display());
    Ok(())
}
