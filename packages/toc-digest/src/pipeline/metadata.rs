//! Metadata extractor - author, publication title and date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::metadata::Metadata;

static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:authors?(?:\(s\))?[ \t]*[:\-]|by\b)[ \t]*([A-Za-z][A-Za-z,.' \-]*[A-Za-z.])[ \t\r]*$",
    )
    .unwrap()
});

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:publication[ \t]+title|title)[ \t]*[:\-][ \t]*(\S.*?)[ \t\r]*$")
        .unwrap()
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:date|published)[ \t]*[:\-]?[ \t]*(\d{4}-\d{2}-\d{2})\b").unwrap()
});

/// Extract metadata from raw document text.
pub fn extract_metadata(text: &str) -> Metadata {
    Metadata {
        author: first_capture(&AUTHOR, text),
        publication_title: first_capture(&TITLE, text),
        date: extract_date(text),
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First labelled `YYYY-MM-DD` that is a real calendar date.
fn extract_date(text: &str) -> Option<NaiveDate> {
    DATE.captures_iter(text)
        .find_map(|caps| NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Publication Title: Journal of Risk\r\nAuthor: Smith, Jane A.\nDate: 2020-11-05\n\n1. Intro\n";

    #[test]
    fn test_extracts_all_fields() {
        let metadata = extract_metadata(HEADER);
        assert_eq!(metadata.author.as_deref(), Some("Smith, Jane A."));
        assert_eq!(metadata.publication_title.as_deref(), Some("Journal of Risk"));
        assert_eq!(metadata.date, NaiveDate::from_ymd_opt(2020, 11, 5));
    }

    #[test]
    fn test_by_line_and_published() {
        let metadata = extract_metadata("By John O'Neil\nPublished 2019-01-31\n");
        assert_eq!(metadata.author.as_deref(), Some("John O'Neil"));
        assert_eq!(metadata.date, NaiveDate::from_ymd_opt(2019, 1, 31));
        assert_eq!(metadata.publication_title, None);
    }

    #[test]
    fn test_absent_fields_are_none() {
        assert_eq!(extract_metadata("plain text only"), Metadata::default());
    }

    #[test]
    fn test_invalid_date_is_skipped() {
        let metadata = extract_metadata("Date: 2020-13-45\nPublished: 2021-02-03\n");
        assert_eq!(metadata.date, NaiveDate::from_ymd_opt(2021, 2, 3));
    }

    #[test]
    fn test_author_requires_line_start() {
        let metadata = extract_metadata("This report was written by hand.\n");
        assert_eq!(metadata.author, None);
    }
}
