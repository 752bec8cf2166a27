//! Section slicer - maps heading candidates to spans of body text.
//!
//! Each candidate anchors on the first standalone body line equal to its
//! title that no earlier candidate has claimed. Sections are ordered by
//! where their headings sit in the body, and each one runs until the next
//! located heading line or the end of the document.

use std::collections::HashSet;

use tracing::debug;

use crate::pipeline::toc::{lines_from, Line};
use crate::types::document::{HeadingCandidate, Section, SliceMiss, SliceReport, TableOfContents};

/// Slice `text` into sections using the parsed table of contents.
///
/// The table-of-contents block itself is never searched.
pub fn slice_sections(text: &str, toc: &TableOfContents) -> SliceReport {
    slice_from(text, toc.body_start(), &toc.entries)
}

/// Slice `text` into sections, searching only from byte offset `body_start`.
pub fn slice_from(text: &str, body_start: usize, candidates: &[HeadingCandidate]) -> SliceReport {
    let lines: Vec<Line<'_>> = lines_from(text, body_start).collect();
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut anchors: Vec<(usize, usize, &HeadingCandidate)> = Vec::new();
    let mut misses = Vec::new();

    for candidate in candidates {
        let found = lines
            .iter()
            .find(|line| !claimed.contains(&line.start) && line.content.trim() == candidate.title);

        match found {
            Some(line) => {
                claimed.insert(line.start);
                anchors.push((line.start, line.end, candidate));
            }
            None => {
                debug!(title = %candidate.title, number = candidate.number, "heading not found in body");
                misses.push(SliceMiss {
                    candidate: candidate.clone(),
                });
            }
        }
    }

    // Body order governs slicing, not listing order.
    anchors.sort_by_key(|(start, _, _)| *start);

    let sections = anchors
        .iter()
        .enumerate()
        .map(|(i, (heading_offset, body_from, candidate))| {
            let end = anchors
                .get(i + 1)
                .map(|(next_heading, _, _)| *next_heading)
                .unwrap_or(text.len());
            Section::new(
                candidate.title.clone(),
                &text[*body_from..end],
                *heading_offset,
                *body_from..end,
            )
        })
        .collect();

    SliceReport { sections, misses }
}
