//! Document types - raw documents, heading candidates and sliced sections.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A plain-text document read from disk.
///
/// Immutable once read; discarded after its row is produced.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path the document was read from
    pub path: PathBuf,

    /// Document title (file stem), used as the output row key
    pub title: String,

    /// Raw text content
    pub text: String,
}

impl Document {
    /// Create a document, deriving its title from the file stem.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let title = Self::title_for(&path);
        Self {
            path,
            title,
            text: text.into(),
        }
    }

    /// Title a document at `path` would get.
    pub fn title_for(path: &Path) -> String {
        path.file_stem()
            .or_else(|| path.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Override the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A heading listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    /// Sequence number as written (not required to be contiguous)
    pub number: u32,

    /// Trimmed title text
    pub title: String,
}

impl HeadingCandidate {
    /// Create a new heading candidate.
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
        }
    }
}

/// A parsed table-of-contents block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOfContents {
    /// Candidates in listed order
    pub entries: Vec<HeadingCandidate>,

    /// Byte span of the block within the document
    pub span: Range<usize>,
}

impl TableOfContents {
    /// Number of listed headings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the block lists no headings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte offset where the body (everything after the block) starts.
    pub fn body_start(&self) -> usize {
        self.span.end
    }
}

/// A section located in the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading title; `None` for a whole-document fallback section
    pub title: Option<String>,

    /// Raw text between the heading line and the next located heading
    pub raw: String,

    /// Cleaned text (filled in by the cleaning stage)
    pub cleaned: String,

    /// Byte offset of the heading line
    pub heading_offset: usize,

    /// Byte span of `raw` within the document
    pub span: Range<usize>,
}

impl Section {
    /// Create a section from a located heading.
    pub fn new(title: impl Into<String>, raw: impl Into<String>, heading_offset: usize, span: Range<usize>) -> Self {
        Self {
            title: Some(title.into()),
            raw: raw.into(),
            cleaned: String::new(),
            heading_offset,
            span,
        }
    }

    /// A single untitled section covering `text[span]`.
    pub fn untitled(text: &str, span: Range<usize>) -> Self {
        Self {
            title: None,
            raw: text[span.clone()].to_string(),
            cleaned: String::new(),
            heading_offset: span.start,
            span,
        }
    }

    /// Attach cleaned text.
    pub fn with_cleaned(mut self, cleaned: impl Into<String>) -> Self {
        self.cleaned = cleaned.into();
        self
    }

    /// Whether the section has no text.
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// A listed heading that was not found as a standalone body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceMiss {
    pub candidate: HeadingCandidate,
}

/// Output of the section slicer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceReport {
    /// Located sections in document order
    pub sections: Vec<Section>,

    /// Candidates that could not be located
    pub misses: Vec<SliceMiss>,
}

impl SliceReport {
    /// Titles of located sections in document order.
    pub fn titles(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| s.title.as_deref())
            .collect()
    }
}
