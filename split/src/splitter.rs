//! Recursive, fallback-driven text splitting.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tessera_core::Tokenizer;

use crate::config::SentenceSplitterConfig;
use crate::error::{Result, SplitError};
use crate::splitting::{SentenceTokenizer, split_by_char, split_by_regex, split_by_separator};

/// A token-measured piece of text produced by [`RecursiveSplitter::split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// The piece, borrowed from the input.
    pub text: &'a str,
    /// Token size of `text`.
    pub token_size: usize,
    /// Whether the piece came from a paragraph or sentence split.
    pub is_sentence_boundary: bool,
}

/// Conservative token estimate used when the tokenizer rejects a piece.
pub(crate) fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Counts tokens, falling back to [`estimate_tokens`] if the tokenizer fails.
pub(crate) fn token_size(tokenizer: &dyn Tokenizer, text: &str) -> usize {
    tokenizer.count(text).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "tokenizer failed, estimating token size");
        estimate_tokens(text)
    })
}

/// Splits text into pieces that each fit a token budget.
///
/// Splitting functions are tried in a fixed order: paragraph separator, then
/// sentences (both yield sentence-boundary pieces), then the secondary regex,
/// the word separator and finally single characters. The first function that
/// yields more than one piece wins; pieces still over budget are split again.
pub struct RecursiveSplitter {
    paragraph_separator: String,
    sentences: SentenceTokenizer,
    secondary: Regex,
    separator: String,
    tokenizer: Arc<dyn Tokenizer>,
}

impl fmt::Debug for RecursiveSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursiveSplitter")
            .field("paragraph_separator", &self.paragraph_separator)
            .field("separator", &self.separator)
            .field("secondary", &self.secondary.as_str())
            .field("tokenizer", &self.tokenizer.name())
            .finish_non_exhaustive()
    }
}

impl RecursiveSplitter {
    /// Creates a splitter from a configuration and a tokenizer.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the configuration is invalid.
    pub fn new(config: &SentenceSplitterConfig, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        let secondary = config.compile_secondary_regex()?;
        Ok(Self {
            paragraph_separator: config.paragraph_separator.clone(),
            sentences: SentenceTokenizer::new(&config.abbreviations)?,
            secondary,
            separator: config.separator.clone(),
            tokenizer,
        })
    }

    /// Replaces the tokenizer.
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// The tokenizer used for measuring pieces.
    #[must_use]
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Splits `text` into ordered pieces of at most `budget` tokens.
    ///
    /// A piece the tokenizer cannot encode is kept whole with an estimated size
    /// capped at the budget.
    ///
    /// # Errors
    /// Returns [`SplitError::IndivisibleUnit`] if a single grapheme is over budget.
    pub fn split<'a>(&self, text: &'a str, budget: usize) -> Result<Vec<Chunk<'a>>> {
        let mut chunks = Vec::new();
        self.split_into(text, budget, true, &mut chunks)?;
        Ok(chunks)
    }

    fn split_into<'a>(
        &self,
        text: &'a str,
        budget: usize,
        is_sentence_boundary: bool,
        chunks: &mut Vec<Chunk<'a>>,
    ) -> Result<()> {
        let token_size = match self.tokenizer.count(text) {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    chars = text.chars().count(),
                    "tokenizer failed, keeping piece whole"
                );
                chunks.push(Chunk {
                    text,
                    token_size: estimate_tokens(text).min(budget),
                    is_sentence_boundary,
                });
                return Ok(());
            }
        };
        if token_size <= budget {
            chunks.push(Chunk {
                text,
                token_size,
                is_sentence_boundary,
            });
            return Ok(());
        }

        let (pieces, is_sentence_boundary) = self.splits_by_fns(text);
        if pieces.len() <= 1 {
            return Err(SplitError::IndivisibleUnit { token_size, budget });
        }
        for piece in pieces {
            self.split_into(piece, budget, is_sentence_boundary, chunks)?;
        }
        Ok(())
    }

    fn splits_by_fns<'a>(&self, text: &'a str) -> (Vec<&'a str>, bool) {
        let pieces = split_by_separator(text, &self.paragraph_separator);
        if pieces.len() > 1 {
            return (pieces, true);
        }
        let pieces = self.sentences.spans(text);
        if pieces.len() > 1 {
            return (pieces, true);
        }
        let pieces = split_by_regex(text, &self.secondary);
        if pieces.len() > 1 {
            return (pieces, false);
        }
        let pieces = split_by_separator(text, &self.separator);
        if pieces.len() > 1 {
            return (pieces, false);
        }
        (split_by_char(text), false)
    }
}
