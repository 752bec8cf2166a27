//! Summary model trait - the boundary to the external summarization model.
//!
//! The pipeline only needs `text -> text`. Input capping, chunking, retries
//! and timeouts live in [`crate::pipeline::summarize::Summarizer`], so a
//! model implementation can stay a thin wrapper around one call.

use async_trait::async_trait;

use crate::error::SummarizeResult;

/// A pretrained summarization model.
///
/// Implementations are loaded once per process and shared read-only
/// across workers.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Summarize `input`. The input never exceeds [`Self::max_input_chars`].
    async fn summarize(&self, input: &str) -> SummarizeResult<String>;

    /// Largest input, in characters, the model accepts.
    fn max_input_chars(&self) -> usize {
        usize::MAX
    }

    /// Model name for logs.
    fn name(&self) -> &str {
        "model"
    }
}
