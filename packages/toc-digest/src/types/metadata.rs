//! Document-level metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value written to the output table for a missing metadata field.
pub const MISSING_FIELD: &str = "N/A";

/// Author, publication title and date found in a document.
///
/// Every field is optional; absence is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub author: Option<String>,
    pub publication_title: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Metadata {
    /// Author or the missing-field marker.
    pub fn author_or_missing(&self) -> String {
        self.author.clone().unwrap_or_else(|| MISSING_FIELD.to_string())
    }

    /// Publication title or the missing-field marker.
    pub fn publication_title_or_missing(&self) -> String {
        self.publication_title
            .clone()
            .unwrap_or_else(|| MISSING_FIELD.to_string())
    }

    /// Date as `YYYY-MM-DD` or the missing-field marker.
    pub fn date_or_missing(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| MISSING_FIELD.to_string())
    }
}
