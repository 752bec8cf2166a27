//! Configuration types for the pipeline and the summarizer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// What to do with a file in which no section could be located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSectionsPolicy {
    /// Treat the whole body as one untitled section.
    #[default]
    WholeDocument,

    /// Produce no row for the file.
    Skip,
}

/// Text the correlation summary is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationScope {
    /// Aggregate of the cleaned sections.
    #[default]
    Sections,

    /// The whole cleaned document.
    FullDocument,
}

/// Configuration for the pipeline driver.
///
/// Deserializes from partial JSON; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum files processed concurrently.
    ///
    /// Default: 4.
    pub concurrency: usize,

    /// File extensions (without the dot) treated as input.
    ///
    /// Default: `["txt"]`.
    pub extensions: Vec<String>,

    /// Skip files whose title already has a row in the output table.
    ///
    /// Default: true.
    pub resume: bool,

    /// Budget for one file's full pipeline. `None` disables the limit.
    ///
    /// JSON key `file_timeout_secs`, in seconds. Default: 360 seconds.
    #[serde(rename = "file_timeout_secs", with = "secs::option")]
    pub file_timeout: Option<Duration>,

    /// Policy for files without located sections.
    pub no_sections: NoSectionsPolicy,

    /// Scope of the correlation summary.
    pub correlation_scope: CorrelationScope,

    /// Keywords that must co-occur in a sentence for the correlation summary.
    pub correlation_keywords: (String, String),

    /// Summarizer settings.
    pub summarizer: SummarizerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            extensions: vec!["txt".to_string()],
            resume: true,
            file_timeout: Some(Duration::from_secs(360)),
            no_sections: NoSectionsPolicy::default(),
            correlation_scope: CorrelationScope::default(),
            correlation_keywords: ("climate change".to_string(), "insurance".to_string()),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set concurrency (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set accepted extensions.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.into()).collect();
        self
    }

    /// Enable or disable resuming.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Set the per-file timeout.
    pub fn with_file_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.file_timeout = timeout;
        self
    }

    /// Set the no-sections policy.
    pub fn with_no_sections(mut self, policy: NoSectionsPolicy) -> Self {
        self.no_sections = policy;
        self
    }

    /// Set the correlation scope.
    pub fn with_correlation_scope(mut self, scope: CorrelationScope) -> Self {
        self.correlation_scope = scope;
        self
    }

    /// Set the correlation keywords.
    pub fn with_correlation_keywords(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.correlation_keywords = (a.into(), b.into());
        self
    }

    /// Set summarizer settings.
    pub fn with_summarizer(mut self, summarizer: SummarizerConfig) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Load settings from a JSON file.
    ///
    /// Durations are given in seconds and may be fractional, e.g.
    /// `{"file_timeout_secs": 60, "summarizer": {"retry_backoff_secs": 0.5}}`.
    /// `"file_timeout_secs": null` disables the per-file limit.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Whether `ext` is an accepted input extension (case-insensitive).
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Configuration for the summarizer adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Hard cap on input characters sent to the model per summary.
    ///
    /// The effective cap is the smaller of this and the model's own limit.
    /// Default: 8192.
    pub max_input_chars: usize,

    /// Size of each chunk summarized by one model call.
    ///
    /// Default: 2048.
    pub chunk_chars: usize,

    /// Inputs shorter than this are not sent to the model.
    ///
    /// Default: 50.
    pub min_input_chars: usize,

    /// Attempts per model call, including the first.
    ///
    /// Default: 3.
    pub max_attempts: usize,

    /// Base delay between attempts; doubles on each retry.
    ///
    /// JSON key `retry_backoff_secs`, in seconds. Default: 500ms.
    #[serde(rename = "retry_backoff_secs", with = "secs")]
    pub retry_backoff: Duration,

    /// Budget for a single model call.
    ///
    /// JSON key `call_timeout_secs`, in seconds. Default: 120 seconds.
    #[serde(rename = "call_timeout_secs", with = "secs")]
    pub call_timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 8192,
            chunk_chars: 2048,
            min_input_chars: 50,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            call_timeout: Duration::from_secs(120),
        }
    }
}

impl SummarizerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input cap.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Set the chunk size (at least 1).
    pub fn with_chunk_chars(mut self, chunk: usize) -> Self {
        self.chunk_chars = chunk.max(1);
        self
    }

    /// Set the minimum input length.
    pub fn with_min_input_chars(mut self, min: usize) -> Self {
        self.min_input_chars = min;
        self
    }

    /// Set the attempt count (at least 1).
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base retry delay.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Durations as (fractional) seconds in config files.
mod secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            let secs = Option::<f64>::deserialize(deserializer)?;
            secs.map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
