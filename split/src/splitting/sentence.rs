//! Sentence boundary detection.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::config::DEFAULT_ABBREVIATIONS;
use crate::error::{Result, SplitError};

static URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(https?://\S+|www\.\S+|ftp://\S+|(mailto:)?[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}|file://\S+)",
    )
    .expect("uri pattern is valid")
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}(?:,\d{3})*(?:\.\d+)?\b").expect("number pattern is valid")
});

static DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([.?!… ]*)([.?!…])(["'”’)}\]]?)"#).expect("delimiter pattern is valid")
});

static DEFAULT_TOKENIZER: LazyLock<SentenceTokenizer> =
    LazyLock::new(SentenceTokenizer::default);

/// Splits text into sentences.
///
/// Abbreviations, URLs, e-mail addresses and numbers such as `1,234.56` are
/// protected before terminators (`.`, `?`, `!`, `…`, optionally followed by a
/// closing quote or bracket) are located, so none of them end a sentence.
#[derive(Debug, Clone)]
pub struct SentenceTokenizer {
    abbreviations: Option<Regex>,
}

impl Default for SentenceTokenizer {
    fn default() -> Self {
        Self::build(&DEFAULT_ABBREVIATIONS).expect("default abbreviations are valid")
    }
}

impl SentenceTokenizer {
    /// Creates a tokenizer that treats `abbreviations` as non-terminators.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the abbreviation list produces a pattern
    /// over the regex size limit.
    pub fn new<I, S>(abbreviations: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let abbreviations: Vec<S> = abbreviations.into_iter().collect();
        Self::build(&abbreviations)
    }

    fn build<S: AsRef<str>>(abbreviations: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = abbreviations
            .iter()
            .map(|abbreviation| abbreviation.as_ref())
            .filter(|abbreviation| !abbreviation.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self {
                abbreviations: None,
            });
        }
        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|err| SplitError::Configuration(format!("invalid abbreviations: {err}")))?;
        Ok(Self {
            abbreviations: Some(pattern),
        })
    }

    /// Returns the sentences of `text`, trimmed, without empty entries.
    #[must_use]
    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans(text)
            .into_iter()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    /// Returns the sentences of `text` untrimmed.
    ///
    /// Whitespace following a terminator stays with the sentence it ends, so the
    /// spans concatenate back to `text`.
    #[must_use]
    pub fn spans<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let protected = self.protected_ranges(text);
        let mut ends = Vec::new();
        let mut cursor = 0;
        let tail = text.len()..text.len();
        for range in protected.iter().chain(std::iter::once(&tail)) {
            if range.start > cursor {
                ends.extend(
                    DELIMITER
                        .find_iter(&text[cursor..range.start])
                        .map(|found| cursor + found.end()),
                );
            }
            cursor = cursor.max(range.end);
        }

        let mut spans = Vec::new();
        let mut start = 0;
        for end in ends {
            let rest = &text[end..];
            let end = end + (rest.len() - rest.trim_start().len());
            if end > start {
                spans.push(&text[start..end]);
                start = end;
            }
        }
        if start < text.len() {
            spans.push(&text[start..]);
        }
        spans
    }

    /// Byte ranges that must not contain a sentence boundary, sorted and disjoint.
    fn protected_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let mut ranges: BTreeMap<usize, usize> = BTreeMap::new();
        let patterns = self.abbreviations.iter().chain([&*URI, &*NUMBER]);
        for pattern in patterns {
            for found in pattern.find_iter(text) {
                if found.start() == found.end() {
                    continue;
                }
                let overlaps = ranges
                    .range(..found.end())
                    .next_back()
                    .is_some_and(|(_, &end)| end > found.start());
                if !overlaps {
                    ranges.insert(found.start(), found.end());
                }
            }
        }
        ranges.into_iter().map(|(start, end)| start..end).collect()
    }
}

/// Splits `text` into trimmed sentences using the default abbreviation list.
///
/// ```rust
/// use tessera_split::splitting::split_sentences;
///
/// assert_eq!(
///     split_sentences("Prices rose 1,234.56 points, i.e. a lot. Then they fell!"),
///     ["Prices rose 1,234.56 points, i.e. a lot.", "Then they fell!"]
/// );
/// ```
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    DEFAULT_TOKENIZER.tokenize(text)
}
