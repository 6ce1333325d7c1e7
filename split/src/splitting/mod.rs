//! Stateless text splitting functions.
//!
//! Every function returns borrowed, non-empty pieces of its input in order. The
//! pieces of [`split_by_separator`], [`split_by_regex`] and [`split_by_char`]
//! concatenate back to the input exactly.

mod sentence;

pub use sentence::{SentenceTokenizer, split_sentences};

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Splits `text` on `separator`, keeping the separator as a prefix of every piece after the first.
///
/// ```rust
/// use tessera_split::splitting::split_by_separator;
///
/// assert_eq!(split_by_separator("a b  c", " "), ["a", " b", " ", " c"]);
/// ```
#[must_use]
pub fn split_by_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return split_by_char(text);
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Splits `text` before every match of `pattern`.
///
/// Text the pattern does not cover stays attached to the preceding piece, so
/// nothing is lost when the pattern skips characters.
#[must_use]
pub fn split_by_regex<'a>(text: &'a str, pattern: &Regex) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for found in pattern.find_iter(text) {
        if found.start() > start {
            pieces.push(&text[start..found.start()]);
            start = found.start();
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Splits `text` into extended grapheme clusters.
#[must_use]
pub fn split_by_char(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}
