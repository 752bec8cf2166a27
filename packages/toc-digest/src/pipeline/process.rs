//! Per-file processing: parse → slice → clean → summarize.
//!
//! A worker runs one file through every stage and hands the finished row
//! back to the driver. It never touches the output table.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::pipeline::clean::clean_text;
use crate::pipeline::correlation::Correlation;
use crate::pipeline::metadata::extract_metadata;
use crate::pipeline::slice::slice_sections;
use crate::pipeline::summarize::Summarizer;
use crate::pipeline::toc::parse_table_of_contents;
use crate::traits::model::SummaryModel;
use crate::types::config::{CorrelationScope, NoSectionsPolicy, PipelineConfig};
use crate::types::document::{Document, Section, SliceReport};
use crate::types::row::{FileOutcome, FileStage, OutputRow};

/// Separator between sections in the extracted-text column.
pub const SECTION_SEPARATOR: &str = " | ";

/// Shared view of how far a file has got.
///
/// The driver keeps a clone so it can name the stage when a worker times
/// out or panics.
#[derive(Debug, Clone)]
pub struct Progress(Arc<Mutex<FileStage>>);

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Start at `Pending`.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(FileStage::Pending)))
    }

    /// Last stage reached.
    pub fn current(&self) -> FileStage {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stage currently being attempted.
    pub fn attempting(&self) -> FileStage {
        let current = self.current();
        current.next().unwrap_or(current)
    }

    fn advance(&self, stage: FileStage) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = stage;
        debug!(%stage, "Stage reached");
    }
}

/// Read `path` and run it through every stage.
pub async fn process_file<M: SummaryModel>(
    path: PathBuf,
    summarizer: &Summarizer<M>,
    config: &PipelineConfig,
    progress: &Progress,
) -> FileOutcome {
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            let error = PipelineError::io(&path, e);
            return FileOutcome::failed(path, progress.attempting(), error);
        }
    };

    process_document(Document::new(path, text), summarizer, config, progress).await
}

/// Run an already-read document through every stage.
pub async fn process_document<M: SummaryModel>(
    document: Document,
    summarizer: &Summarizer<M>,
    config: &PipelineConfig,
    progress: &Progress,
) -> FileOutcome {
    let text = document.text.as_str();

    // Parsed
    let toc = match parse_table_of_contents(text) {
        Ok(toc) => {
            debug!(headings = toc.len(), "Table of contents found");
            Some(toc)
        }
        Err(e) => {
            info!(title = %document.title, "{}", e);
            None
        }
    };
    progress.advance(FileStage::Parsed);

    // Sliced
    let report = toc
        .as_ref()
        .map(|toc| slice_sections(text, toc))
        .unwrap_or_default();
    if !report.misses.is_empty() {
        debug!(missed = report.misses.len(), "Headings not located in body");
    }
    let body_start = toc.as_ref().map(|t| t.body_start()).unwrap_or(0);
    let sections = match sections_or_fallback(report, text, body_start, config.no_sections) {
        Some(sections) => sections,
        None => {
            info!(title = %document.title, "No sections located, skipping");
            return FileOutcome::NoSections {
                path: document.path,
            };
        }
    };
    progress.advance(FileStage::Sliced);

    // Cleaned
    let sections: Vec<Section> = sections
        .into_iter()
        .map(|s| {
            let cleaned = clean_text(&s.raw);
            s.with_cleaned(cleaned)
        })
        .collect();
    let extracted_text = format_extracted_text(&sections);
    let aggregate = sections
        .iter()
        .map(|s| s.cleaned.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let correlation_source = match config.correlation_scope {
        CorrelationScope::Sections => aggregate.clone(),
        CorrelationScope::FullDocument => clean_text(text),
    };
    let metadata = extract_metadata(text);
    progress.advance(FileStage::Cleaned);

    // Summarized
    let summary = match summarizer.summarize(&aggregate).await {
        Ok(summary) => summary,
        Err(e) => return FileOutcome::failed(document.path, FileStage::Summarized, e.into()),
    };
    let (first, second) = &config.correlation_keywords;
    let correlation = match Correlation::new(first, second)
        .summarize(summarizer, &correlation_source)
        .await
    {
        Ok(correlation) => correlation,
        Err(e) => return FileOutcome::failed(document.path, FileStage::Summarized, e.into()),
    };
    progress.advance(FileStage::Summarized);

    info!(
        title = %document.title,
        sections = sections.len(),
        "Document processed"
    );

    FileOutcome::Row {
        path: document.path,
        row: OutputRow::new(document.title)
            .with_extracted_text(extracted_text)
            .with_summary(summary)
            .with_correlation_summary(correlation)
            .with_metadata(&metadata),
    }
}

/// Located sections, or the policy's fallback when there are none.
fn sections_or_fallback(
    report: SliceReport,
    text: &str,
    body_start: usize,
    policy: NoSectionsPolicy,
) -> Option<Vec<Section>> {
    if !report.sections.is_empty() {
        return Some(report.sections);
    }
    match policy {
        NoSectionsPolicy::WholeDocument => Some(vec![Section::untitled(text, body_start..text.len())]),
        NoSectionsPolicy::Skip => None,
    }
}

/// `"<title>: <cleaned>"` per section, in document order.
pub fn format_extracted_text(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| match &s.title {
            Some(title) if s.cleaned.is_empty() => title.clone(),
            Some(title) => format!("{}: {}", title, s.cleaned),
            None => s.cleaned.clone(),
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}
