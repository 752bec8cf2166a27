//! Testing utilities including a mock summarization model.
//!
//! Useful for testing applications that use the digest library
//! without loading a real model or making network calls.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{SummarizationError, SummarizeResult};
use crate::traits::model::SummaryModel;

/// A mock summary model for testing.
///
/// Returns deterministic, configurable responses and records every input
/// it receives.
#[derive(Default)]
pub struct MockModel {
    /// Responses keyed by a substring of the input
    responses: Arc<RwLock<Vec<(String, String)>>>,

    /// Response when no keyed response matches
    default_response: Option<String>,

    /// Inputs containing any of these always fail
    poison: Arc<RwLock<Vec<String>>>,

    /// Remaining calls that fail before calls start succeeding
    failures_left: Arc<AtomicUsize>,

    /// Input limit reported to the adapter
    max_input_chars: Option<usize>,

    /// Artificial latency per call
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,

    /// Calls currently running
    in_flight: Arc<AtomicUsize>,

    /// Most calls ever running at once
    peak_in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter even when a call is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockModel {
    /// Create a new mock model with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` when the input contains `needle`.
    pub fn with_response(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((needle.into(), response.into()));
        self
    }

    /// Respond with `response` when nothing else matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Fail every call whose input contains `needle`.
    pub fn failing_on(self, needle: impl Into<String>) -> Self {
        self.poison.write().unwrap().push(needle.into());
        self
    }

    /// Fail the next `n` calls.
    pub fn failing_times(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Report an input limit.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = Some(max);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all inputs passed to this mock.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Most calls that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    /// Generate a default summary: the first few words of the input.
    fn default_summary(&self, input: &str) -> String {
        let lead: Vec<&str> = input.split_whitespace().take(8).collect();
        format!("Summary: {}", lead.join(" "))
    }
}

#[async_trait]
impl SummaryModel for MockModel {
    async fn summarize(&self, input: &str) -> SummarizeResult<String> {
        self.calls.write().unwrap().push(input.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(Arc::clone(&self.in_flight));
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let poisoned = self
            .poison
            .read()
            .unwrap()
            .iter()
            .any(|needle| input.contains(needle.as_str()));
        if poisoned {
            return Err(SummarizationError::model("mock model refused input"));
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SummarizationError::model("mock model failure"));
        }

        let keyed = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| input.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        Ok(keyed
            .or_else(|| self.default_response.clone())
            .unwrap_or_else(|| self.default_summary(input)))
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars.unwrap_or(usize::MAX)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
