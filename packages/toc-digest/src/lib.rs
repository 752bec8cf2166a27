//! Table-of-Contents Digest Library
//!
//! Turns a directory of plain-text reports into a resumable CSV digest:
//! one row per document with its sections, an overall summary, a summary of
//! the sentences where two keywords co-occur, and basic metadata.
//!
//! # Pipeline
//!
//! Each file moves through `parse → slice → clean → summarize`, then the
//! driver appends its row. Files run concurrently; the table has exactly
//! one writer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use toc_digest::{CsvTable, Pipeline, PipelineConfig, Summarizer};
//! use toc_digest::testing::MockModel;
//!
//! let summarizer = Arc::new(Summarizer::new(MockModel::new()));
//! let table = CsvTable::open("out/digest.csv").await?;
//!
//! let report = Pipeline::new(summarizer, table)
//!     .with_config(PipelineConfig::default().with_concurrency(4))
//!     .run(Path::new("reports"))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (SummaryModel, ResultTable)
//! - [`types`] - Documents, sections, rows and configuration
//! - [`pipeline`] - Parsing, slicing, cleaning, summarizing and the driver
//! - [`stores`] - Output tables (CsvTable, MemoryTable)
//! - [`testing`] - Mock model for testing

pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{ParseError, PipelineError, SummarizationError, TableError};
pub use traits::{model::SummaryModel, table::ResultTable};
pub use types::{
    config::{CorrelationScope, NoSectionsPolicy, PipelineConfig, SummarizerConfig},
    document::{Document, HeadingCandidate, Section, SliceMiss, SliceReport, TableOfContents},
    metadata::{Metadata, MISSING_FIELD},
    row::{FileFailure, FileOutcome, FileStage, OutputRow, RunReport, COLUMNS},
};

// Re-export pipeline components
pub use pipeline::{
    // Parsing and slicing
    clean_text, extract_headings, extract_metadata, parse_table_of_contents, slice_sections,
    // Summarization
    Correlation, Summarizer, TOO_SHORT,
    // Driver
    discover_files, process_file, Pipeline,
};

// Re-export stores
pub use stores::{CsvTable, MemoryTable};

// Re-export testing utilities
pub use testing::MockModel;
