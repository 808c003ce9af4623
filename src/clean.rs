//! Text cleaning capability.
//!
//! The combiner does not hard-code a cleaning routine; it is handed a
//! [`TextCleaner`]. [`HtmlTextCleaner`] is the stock implementation used by
//! the `jobidx` binary.

use regex::Regex;
use std::sync::LazyLock;

/// Pure, stateless text normalization applied to every text field.
///
/// Implementations must return the same output for the same input and be
/// safe to call from several threads at once.
pub trait TextCleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

impl<F> TextCleaner for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn clean(&self, text: &str) -> String {
        self(text)
    }
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Strips markup tags, punctuation and digits, then lowercases and trims.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextCleaner;

impl TextCleaner for HtmlTextCleaner {
    fn clean(&self, text: &str) -> String {
        let text = TAG_RE.replace_all(text, "");
        let text = PUNCT_RE.replace_all(&text, "");
        let text = DIGIT_RE.replace_all(&text, "");
        text.to_lowercase().trim().to_string()
    }
}
