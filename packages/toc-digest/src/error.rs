//! Typed errors for the digest library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::row::RunReport;

/// Errors that can end a pipeline run or a single file's processing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file or directory could not be read
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Summarization failed after retries
    #[error("summarization failed: {0}")]
    Summarization(#[from] SummarizationError),

    /// Output table could not be read or written
    #[error("output table error: {0}")]
    Output(#[from] TableError),

    /// File did not finish within the per-file budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Worker task panicked
    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Run stopped because the output table became unwritable.
    ///
    /// Carries the partial report. The append failure that caused the abort
    /// is recorded in `report.failures` at stage `Appended`.
    #[error("run aborted after {} rows: {reason}", .report.rows_appended)]
    Aborted {
        reason: String,
        report: Box<RunReport>,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Table-of-contents parsing outcome that is not an error for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `<number>. <title>` block in the document
    #[error("no table of contents block found")]
    NoTableOfContents,
}

/// Errors from the summarization boundary.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// Underlying model call failed
    #[error("model error: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Model call exceeded its time budget
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// All attempts failed
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<SummarizationError>,
    },
}

impl SummarizationError {
    /// Build a model error from anything displayable.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into().into())
    }
}

/// Errors from the output table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying file operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Existing table has unexpected columns
    #[error("unexpected header in {}: {found:?}", .path.display())]
    HeaderMismatch { path: PathBuf, found: Vec<String> },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for summarization.
pub type SummarizeResult<T> = std::result::Result<T, SummarizationError>;

/// Result type alias for table operations.
pub type TableResult<T> = std::result::Result<T, TableError>;
