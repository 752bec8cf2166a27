//! Correlation summarizer - summarizes only sentences where two keywords co-occur.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SummarizeResult;
use crate::pipeline::summarize::Summarizer;
use crate::traits::model::SummaryModel;

static SENTENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());

/// Split text into sentences, keeping their terminators.
pub fn sentences(text: &str) -> impl Iterator<Item = &str> {
    SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Case-insensitive keyword pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    first: String,
    second: String,
}

impl Default for Correlation {
    fn default() -> Self {
        Self::new("climate change", "insurance")
    }
}

impl Correlation {
    /// Create a keyword pair.
    pub fn new(first: impl AsRef<str>, second: impl AsRef<str>) -> Self {
        Self {
            first: first.as_ref().to_lowercase(),
            second: second.as_ref().to_lowercase(),
        }
    }

    /// Sentences of `text` containing both keywords.
    pub fn matching_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        sentences(text)
            .filter(|sentence| {
                let lower = sentence.to_lowercase();
                lower.contains(&self.first) && lower.contains(&self.second)
            })
            .collect()
    }

    /// The text that would be summarized: matching sentences joined by spaces.
    pub fn filtered_input(&self, text: &str) -> String {
        self.matching_sentences(text).join(" ")
    }

    /// Summarize the co-occurring sentences.
    ///
    /// Returns an empty string, without calling the model, when no sentence
    /// contains both keywords.
    pub async fn summarize<M: SummaryModel>(
        &self,
        summarizer: &Summarizer<M>,
        text: &str,
    ) -> SummarizeResult<String> {
        let input = self.filtered_input(text);
        if input.is_empty() {
            return Ok(String::new());
        }
        summarizer.summarize(&input).await
    }
}
