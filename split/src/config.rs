//! Configuration for the splitters.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tessera_core::Settings;

use crate::error::{Result, SplitError};

/// Default separator between words.
pub const DEFAULT_SEPARATOR: &str = " ";
/// Default separator between paragraphs.
pub const DEFAULT_PARAGRAPH_SEPARATOR: &str = "\n\n\n";
/// Default clause-level fallback pattern.
pub const DEFAULT_SECONDARY_CHUNKING_REGEX: &str = "[^,.;。？！]+[,.;。？！]?";
/// Abbreviations that never end a sentence, matched case-insensitively.
pub const DEFAULT_ABBREVIATIONS: [&str; 5] = ["i.e.", "etc.", "vs.", "Inc.", "A.S.A.P."];

/// Default number of sentences captured on each side of a sentence.
pub const DEFAULT_WINDOW_SIZE: usize = 3;
/// Default metadata key holding the sentence window.
pub const DEFAULT_WINDOW_METADATA_KEY: &str = "window";
/// Default metadata key holding the original sentence.
pub const DEFAULT_ORIGINAL_TEXT_METADATA_KEY: &str = "originalText";

/// Settings of a [`SentenceSplitter`](crate::SentenceSplitter).
///
/// `chunk_size` and `chunk_overlap` default to the current [`Settings`] values.
/// The tokenizer is not part of the serializable configuration; it is attached to
/// the splitter itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SentenceSplitterConfig {
    /// The token chunk size for each chunk.
    pub chunk_size: usize,
    /// The token overlap of each chunk when splitting.
    pub chunk_overlap: usize,
    /// Default separator for splitting into words.
    pub separator: String,
    /// Separator between paragraphs.
    pub paragraph_separator: String,
    /// Backup regex for splitting into sentences.
    pub secondary_chunking_regex: String,
    /// Abbreviations that do not terminate a sentence.
    pub abbreviations: Vec<String>,
}

impl Default for SentenceSplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: Settings::chunk_size().unwrap_or(tessera_core::settings::DEFAULT_CHUNK_SIZE),
            chunk_overlap: Settings::chunk_overlap(),
            separator: DEFAULT_SEPARATOR.to_string(),
            paragraph_separator: DEFAULT_PARAGRAPH_SEPARATOR.to_string(),
            secondary_chunking_regex: DEFAULT_SECONDARY_CHUNKING_REGEX.to_string(),
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl SentenceSplitterConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> SentenceSplitterConfigBuilder {
        SentenceSplitterConfigBuilder::new()
    }

    /// Checks sizes, separators and the fallback pattern.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if `chunk_size` is zero, the overlap is not
    /// smaller than the chunk size, a separator is empty or the regex does not compile.
    pub fn validate(&self) -> Result<()> {
        self.compile_secondary_regex().map(|_| ())
    }

    pub(crate) fn compile_secondary_regex(&self) -> Result<Regex> {
        if self.chunk_size == 0 {
            return Err(SplitError::Configuration(
                "chunk size must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(SplitError::Configuration(format!(
                "chunk overlap ({}) must be less than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separator.is_empty() || self.paragraph_separator.is_empty() {
            return Err(SplitError::Configuration(
                "separators must not be empty".into(),
            ));
        }
        Regex::new(&self.secondary_chunking_regex).map_err(|err| {
            SplitError::Configuration(format!(
                "invalid secondary chunking regex `{}`: {err}",
                self.secondary_chunking_regex
            ))
        })
    }
}

/// Builder for [`SentenceSplitterConfig`].
#[derive(Debug, Default)]
pub struct SentenceSplitterConfigBuilder {
    config: SentenceSplitterConfig,
}

impl SentenceSplitterConfigBuilder {
    /// Creates a builder seeded with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SentenceSplitterConfig::default(),
        }
    }

    /// Sets the token budget per chunk.
    #[must_use]
    pub const fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Sets the token overlap between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.config.chunk_overlap = chunk_overlap;
        self
    }

    /// Sets the word separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    /// Sets the paragraph separator.
    #[must_use]
    pub fn paragraph_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.paragraph_separator = separator.into();
        self
    }

    /// Sets the clause-level fallback pattern.
    #[must_use]
    pub fn secondary_chunking_regex(mut self, pattern: impl Into<String>) -> Self {
        self.config.secondary_chunking_regex = pattern.into();
        self
    }

    /// Replaces the abbreviation list.
    #[must_use]
    pub fn abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.abbreviations = abbreviations.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    /// See [`SentenceSplitterConfig::validate`].
    pub fn build(self) -> Result<SentenceSplitterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Settings of a [`SentenceWindowNodeParser`](crate::SentenceWindowNodeParser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SentenceWindowConfig {
    /// The number of sentences on each side of a sentence to capture.
    pub window_size: usize,
    /// The metadata key to store the sentence window under.
    pub window_metadata_key: String,
    /// The metadata key to store the original sentence in.
    pub original_text_metadata_key: String,
}

impl Default for SentenceWindowConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            window_metadata_key: DEFAULT_WINDOW_METADATA_KEY.to_string(),
            original_text_metadata_key: DEFAULT_ORIGINAL_TEXT_METADATA_KEY.to_string(),
        }
    }
}

impl SentenceWindowConfig {
    /// Sets the window size.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the window metadata key.
    #[must_use]
    pub fn with_window_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.window_metadata_key = key.into();
        self
    }

    /// Sets the original-text metadata key.
    #[must_use]
    pub fn with_original_text_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.original_text_metadata_key = key.into();
        self
    }

    /// Checks the window size and keys.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the window is empty or a key is blank.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SplitError::Configuration(
                "window size must be greater than zero".into(),
            ));
        }
        if self.window_metadata_key.is_empty() || self.original_text_metadata_key.is_empty() {
            return Err(SplitError::Configuration(
                "window metadata keys must not be empty".into(),
            ));
        }
        Ok(())
    }
}
