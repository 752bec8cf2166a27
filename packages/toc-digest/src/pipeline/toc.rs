//! Heading extractor - parses the table-of-contents block.
//!
//! A table of contents is the first run of consecutive lines shaped like
//! `<number>. <title>`. The run ends at the first line that does not match.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::types::document::{HeadingCandidate, TableOfContents};

static TOC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s+(\S.*?)\s*$").unwrap());

/// A line of text with its byte offsets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    /// Offset of the first byte of the line
    pub start: usize,

    /// Offset just past the line terminator (or end of text)
    pub end: usize,

    /// Line content without `\n` / `\r\n`
    pub content: &'a str,
}

/// Iterate the lines of `text` starting at byte offset `from`.
pub(crate) fn lines_from(text: &str, from: usize) -> impl Iterator<Item = Line<'_>> {
    let mut offset = from;
    text[from..].split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let content = raw
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw);
        Line {
            start,
            end: offset,
            content,
        }
    })
}

/// Parse one table-of-contents line.
fn parse_line(line: &str) -> Option<HeadingCandidate> {
    let caps = TOC_LINE.captures(line)?;
    let number = caps[1].parse::<u32>().ok()?;
    Some(HeadingCandidate::new(number, caps[2].trim()))
}

/// Locate and parse the table-of-contents block.
pub fn parse_table_of_contents(text: &str) -> Result<TableOfContents, ParseError> {
    let mut entries = Vec::new();
    let mut span_start = None;
    let mut span_end = 0;

    for line in lines_from(text, 0) {
        match parse_line(line.content) {
            Some(candidate) => {
                span_start.get_or_insert(line.start);
                span_end = line.end;
                entries.push(candidate);
            }
            None if span_start.is_some() => break,
            None => {}
        }
    }

    match span_start {
        Some(start) => Ok(TableOfContents {
            entries,
            span: start..span_end,
        }),
        None => Err(ParseError::NoTableOfContents),
    }
}

/// Ordered heading candidates; empty when the document has no table of contents.
pub fn extract_headings(text: &str) -> Vec<HeadingCandidate> {
    parse_table_of_contents(text)
        .map(|toc| toc.entries)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_ordered_pairs() {
        let text = "1. Introduction\n2. Methods\n...body...\nIntroduction\nfoo bar\nMethods\nbaz qux";
        assert_eq!(
            extract_headings(text),
            vec![
                HeadingCandidate::new(1, "Introduction"),
                HeadingCandidate::new(2, "Methods"),
            ]
        );
    }

    #[test]
    fn test_block_stops_at_first_non_matching_line() {
        let text = "Contents\n  1. Scope\n3.  Findings  \nnot a heading\n4. Later\n";
        let toc = parse_table_of_contents(text).unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc.entries[1], HeadingCandidate::new(3, "Findings"));
        assert_eq!(&text[toc.span.clone()], "  1. Scope\n3.  Findings  \n");
    }

    #[test]
    fn test_no_block_is_parse_error() {
        assert_eq!(
            parse_table_of_contents("just prose\nand more prose"),
            Err(ParseError::NoTableOfContents)
        );
        assert!(extract_headings("just prose").is_empty());
    }

    #[test]
    fn test_requires_space_after_dot() {
        assert!(extract_headings("1.5 million policies\n").is_empty());
    }

    #[test]
    fn test_preserves_case_and_punctuation() {
        let headings = extract_headings("7. Risk, Re-Insurance & Co.\n");
        assert_eq!(headings[0].title, "Risk, Re-Insurance & Co.");
        assert_eq!(headings[0].number, 7);
    }

    #[test]
    fn test_handles_crlf() {
        let toc = parse_table_of_contents("1. One\r\n2. Two\r\nBody\r\n").unwrap();
        assert_eq!(toc.entries[1].title, "Two");
        assert_eq!(toc.body_start(), "1. One\r\n2. Two\r\n".len());
    }

    #[test]
    fn test_number_overflow_does_not_match() {
        assert!(extract_headings("99999999999. Too big\n").is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn well_formed_block_yields_every_entry(
                titles in proptest::collection::vec("[A-Za-z][A-Za-z ,&-]{0,20}[A-Za-z]", 1..12)
            ) {
                let mut text: String = titles
                    .iter()
                    .enumerate()
                    .map(|(i, t)| format!("{}. {}\n", i + 1, t))
                    .collect();
                text.push_str("\nBody starts here.\n");

                let headings = extract_headings(&text);
                prop_assert_eq!(headings.len(), titles.len());
                for (i, (h, t)) in headings.iter().zip(&titles).enumerate() {
                    prop_assert_eq!(h.number as usize, i + 1);
                    prop_assert_eq!(&h.title, t.trim());
                }
            }
        }
    }
}
