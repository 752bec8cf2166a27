//! Output rows, per-file outcomes and run reports.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::metadata::Metadata;

/// Column names of the output table, in order.
pub const COLUMNS: [&str; 7] = [
    "Title",
    "Extracted Text",
    "Summary",
    "Climate-Insurance Correlation Summary",
    "Author",
    "Publication Title",
    "Date",
];

/// One row of the output table. Exactly one per processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Extracted Text")]
    pub extracted_text: String,

    #[serde(rename = "Summary")]
    pub summary: String,

    #[serde(rename = "Climate-Insurance Correlation Summary")]
    pub correlation_summary: String,

    #[serde(rename = "Author")]
    pub author: String,

    #[serde(rename = "Publication Title")]
    pub publication_title: String,

    #[serde(rename = "Date")]
    pub date: String,
}

impl OutputRow {
    /// Create a row with empty text columns and missing metadata.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            extracted_text: String::new(),
            summary: String::new(),
            correlation_summary: String::new(),
            author: String::new(),
            publication_title: String::new(),
            date: String::new(),
        }
        .with_metadata(&Metadata::default())
    }

    /// Set the extracted text.
    pub fn with_extracted_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = text.into();
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the correlation summary.
    pub fn with_correlation_summary(mut self, summary: impl Into<String>) -> Self {
        self.correlation_summary = summary.into();
        self
    }

    /// Fill metadata columns, using the missing-field marker for gaps.
    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        self.author = metadata.author_or_missing();
        self.publication_title = metadata.publication_title_or_missing();
        self.date = metadata.date_or_missing();
        self
    }
}

/// Stages a file moves through.
///
/// `Pending → Parsed → Sliced → Cleaned → Summarized → Appended`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStage {
    Pending,
    Parsed,
    Sliced,
    Cleaned,
    Summarized,
    Appended,
}

impl FileStage {
    /// The stage a successful transition leads to.
    pub fn next(self) -> Option<FileStage> {
        match self {
            Self::Pending => Some(Self::Parsed),
            Self::Parsed => Some(Self::Sliced),
            Self::Sliced => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Summarized),
            Self::Summarized => Some(Self::Appended),
            Self::Appended => None,
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Parsed => "parsed",
            Self::Sliced => "sliced",
            Self::Cleaned => "cleaned",
            Self::Summarized => "summarized",
            Self::Appended => "appended",
        };
        f.write_str(name)
    }
}

/// A file that failed while transitioning into `stage`.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: FileStage,
    pub error: PipelineError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed at {}: {}",
            self.path.display(),
            self.stage,
            self.error
        )
    }
}

/// What a worker hands back to the driver.
#[derive(Debug)]
pub enum FileOutcome {
    /// Row ready to append
    Row { path: PathBuf, row: OutputRow },

    /// No sections and the policy says skip
    NoSections { path: PathBuf },

    /// Failed at some stage
    Failed(FileFailure),
}

impl FileOutcome {
    /// Build a failure outcome.
    pub fn failed(path: impl Into<PathBuf>, stage: FileStage, error: PipelineError) -> Self {
        Self::Failed(FileFailure {
            path: path.into(),
            stage,
            error,
        })
    }

    /// Path of the file this outcome is for.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Row { path, .. } | Self::NoSections { path } => path,
            Self::Failed(failure) => &failure.path,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of input files found
    pub files_discovered: usize,

    /// Number of rows appended
    pub rows_appended: usize,

    /// Files skipped because their row already exists
    pub skipped_existing: usize,

    /// Files skipped because no sections were found
    pub skipped_no_sections: usize,

    /// Files that failed
    pub failures: Vec<FileFailure>,

    /// Whether dispatch stopped early
    pub cancelled: bool,
}

impl RunReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every dispatched file produced a row or was skipped by policy.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_row_fills_missing_metadata() {
        let row = OutputRow::new("doc");
        assert_eq!(row.author, "N/A");
        assert_eq!(row.publication_title, "N/A");
        assert_eq!(row.date, "N/A");
    }

    #[test]
    fn test_row_formats_date() {
        let metadata = Metadata {
            author: Some("Jane Doe".into()),
            publication_title: None,
            date: NaiveDate::from_ymd_opt(2021, 3, 14),
        };
        let row = OutputRow::new("doc").with_metadata(&metadata);
        assert_eq!(row.author, "Jane Doe");
        assert_eq!(row.publication_title, "N/A");
        assert_eq!(row.date, "2021-03-14");
    }

    #[test]
    fn test_stage_order() {
        let mut stage = FileStage::Pending;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last(), Some(&FileStage::Appended));
    }
}
