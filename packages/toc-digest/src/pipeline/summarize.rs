//! Summarizer adapter - input capping, chunking and retries around a model.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SummarizationError, SummarizeResult};
use crate::traits::model::SummaryModel;
use crate::types::config::SummarizerConfig;

/// Returned instead of a summary when the input is below the minimum length.
pub const TOO_SHORT: &str = "Text too short to summarize";

/// Wraps a [`SummaryModel`] behind a plain `text -> text` contract.
///
/// Create once per process and share it (`Arc<Summarizer<M>>`) across
/// workers; the model is never re-instantiated per file.
pub struct Summarizer<M: SummaryModel> {
    model: M,
    config: SummarizerConfig,
}

impl<M: SummaryModel> Summarizer<M> {
    /// Create with default settings.
    pub fn new(model: M) -> Self {
        Self::with_config(model, SummarizerConfig::default())
    }

    /// Create with custom settings.
    pub fn with_config(model: M, config: SummarizerConfig) -> Self {
        Self { model, config }
    }

    /// The wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Current settings.
    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Effective input cap in characters.
    pub fn input_cap(&self) -> usize {
        self.config.max_input_chars.min(self.model.max_input_chars())
    }

    /// Summarize `text`.
    ///
    /// Input is trimmed and capped, then summarized chunk by chunk; chunk
    /// summaries are joined with a space.
    pub async fn summarize(&self, text: &str) -> SummarizeResult<String> {
        let text = text.trim();
        if text.chars().count() < self.config.min_input_chars {
            return Ok(TOO_SHORT.to_string());
        }

        let capped = truncate_chars(text, self.input_cap());
        let chunk_chars = self.config.chunk_chars.min(self.input_cap()).max(1);
        let chunks = chunk_text(capped, chunk_chars);
        debug!(
            model = self.model.name(),
            input_chars = capped.chars().count(),
            chunks = chunks.len(),
            "Summarizing text"
        );

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let summary = self.call_with_retry(chunk).await?;
            let summary = summary.trim();
            if !summary.is_empty() {
                parts.push(summary.to_string());
            }
        }

        Ok(parts.join(" "))
    }

    /// One model call with timeout, retried with exponential backoff.
    async fn call_with_retry(&self, input: &str) -> SummarizeResult<String> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.config.call_timeout, self.model.summarize(input)).await {
                Ok(result) => result,
                Err(_) => Err(SummarizationError::Timeout(self.config.call_timeout)),
            };

            match result {
                Ok(summary) => return Ok(summary),
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry_backoff(attempt);
                    warn!(
                        model = self.model.name(),
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Summarization failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(SummarizationError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
            }
        }
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.saturating_sub(1).min(5) as u32;
        self.config.retry_backoff.saturating_mul(1u32 << capped)
    }
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Split `text` into chunks of at most `chunk_chars` characters, breaking on
/// whitespace where possible.
pub fn chunk_text(text: &str, chunk_chars: usize) -> Vec<&str> {
    let chunk_chars = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let hard_end = match rest.char_indices().nth(chunk_chars) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(rest);
                break;
            }
        };

        let end = rest[..hard_end]
            .rfind(char::is_whitespace)
            .filter(|&idx| idx > 0)
            .unwrap_or(hard_end);
        chunks.push(rest[..end].trim_end());
        rest = rest[end..].trim_start();
    }

    chunks
}
