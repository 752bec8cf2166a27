//! Digest pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Table-of-contents parsing
//! - Section slicing against the body
//! - Text cleaning and metadata extraction
//! - Overall and correlation summaries
//! - Concurrent per-file processing with a single appender

pub mod clean;
pub mod correlation;
pub mod driver;
pub mod metadata;
pub mod process;
pub mod slice;
pub mod summarize;
pub mod toc;

pub use clean::clean_text;
pub use correlation::{sentences, Correlation};
pub use driver::{discover_files, Pipeline};
pub use metadata::extract_metadata;
pub use process::{format_extracted_text, process_document, process_file, Progress};
pub use slice::{slice_from, slice_sections};
pub use summarize::{chunk_text, truncate_chars, Summarizer, TOO_SHORT};
pub use toc::{extract_headings, parse_table_of_contents};
