//! Text cleaner - strips URLs and normalizes whitespace.

use std::sync::LazyLock;

use regex::Regex;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://\S*").unwrap());

/// Strip URL-shaped substrings, collapse whitespace runs to single spaces, trim.
///
/// Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let without_urls = URL.replace_all(text, " ");
    without_urls.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clean_text_strips_urls() {
        assert_eq!(
            clean_text("See https://example.com/a?b=c for details"),
            "See for details"
        );
        assert_eq!(clean_text("ftp://files.example.org/x.csv"), "");
    }

    #[test]
    fn test_clean_text_normalizes_whitespace() {
        assert_eq!(clean_text("  hello  \n\n\t world \r\n"), "hello world");
    }

    #[test]
    fn test_clean_text_keeps_plain_colons() {
        assert_eq!(clean_text("Note: ratio 3:1"), "Note: ratio 3:1");
    }

    #[test]
    fn test_clean_text_separates_neighbours_of_url() {
        assert_eq!(clean_text("before(http://x.y) after"), "before( after");
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(s in "(\\PC|\\s|://|http|[a-z]{1,4}://[a-z./]{0,8}){0,40}") {
            let once = clean_text(&s);
            prop_assert_eq!(clean_text(&once), once.clone());
        }
    }
}
