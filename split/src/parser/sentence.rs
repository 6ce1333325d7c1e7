//! Token-budgeted splitting that prefers whole sentences.

use std::sync::Arc;

use tessera_core::node::build_nodes_from_splits;
use tessera_core::{MetadataMode, Node, ParsingEvent, Settings, Tokenizer};

use super::{NodeParser, ParserOptions};
use crate::config::SentenceSplitterConfig;
use crate::error::{Result, SplitError};
use crate::merge::merge_chunks;
use crate::splitter::{RecursiveSplitter, token_size};

/// Effective budgets below this many tokens trigger a warning.
const LOW_BUDGET_WARNING: usize = 50;

/// Splits documents into chunks of at most `chunk_size` tokens, keeping
/// paragraphs and sentences together where the budget allows.
///
/// The metadata rendered alongside each chunk counts against the budget: the
/// longer of the embedding and language-model renderings is measured and
/// subtracted from `chunk_size` before splitting.
///
/// ```rust
/// use std::sync::Arc;
/// use tessera_core::CharTokenizer;
/// use tessera_split::{SentenceSplitter, SentenceSplitterConfig};
///
/// let config = SentenceSplitterConfig::builder()
///     .chunk_size(20)
///     .chunk_overlap(0)
///     .build()?;
/// let splitter = SentenceSplitter::new(config)?.with_tokenizer(Arc::new(CharTokenizer));
/// let chunks = splitter.split_text("First sentence. Second sentence.")?;
/// assert_eq!(chunks, ["First sentence.", "Second sentence."]);
/// # Ok::<(), tessera_split::SplitError>(())
/// ```
#[derive(Debug)]
pub struct SentenceSplitter {
    config: SentenceSplitterConfig,
    splitter: RecursiveSplitter,
    options: ParserOptions,
}

impl SentenceSplitter {
    /// Creates a splitter using the tokenizer from [`Settings`].
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the configuration is invalid.
    pub fn new(config: SentenceSplitterConfig) -> Result<Self> {
        let splitter = RecursiveSplitter::new(&config, Settings::tokenizer())?;
        Ok(Self {
            config,
            splitter,
            options: ParserOptions::default(),
        })
    }

    /// Replaces the tokenizer.
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.splitter = self.splitter.with_tokenizer(tokenizer);
        self
    }

    /// Replaces the parser options.
    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SentenceSplitterConfig {
        &self.config
    }

    /// The tokenizer measuring chunks.
    #[must_use]
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        self.splitter.tokenizer()
    }

    /// Splits `text` with the full chunk size as budget.
    ///
    /// # Errors
    /// Returns [`SplitError::IndivisibleUnit`] if a piece cannot fit the budget.
    pub fn split_text(&self, text: &str) -> Result<Vec<String>> {
        self.split_with_budget(text, self.config.chunk_size)
    }

    /// Splits `text`, reserving room for `metadata` in every chunk.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the metadata alone fills the chunk size,
    /// and [`SplitError::IndivisibleUnit`] if a piece cannot fit the remaining budget.
    pub fn split_text_metadata_aware(&self, text: &str, metadata: &str) -> Result<Vec<String>> {
        let metadata_len = token_size(self.tokenizer().as_ref(), metadata);
        let chunk_size = self.config.chunk_size;
        let effective = chunk_size
            .checked_sub(metadata_len)
            .filter(|&budget| budget > 0)
            .ok_or_else(|| {
                SplitError::Configuration(format!(
                    "metadata length ({metadata_len}) is longer than chunk size ({chunk_size}); \
                     increase the chunk size or shrink the metadata"
                ))
            })?;
        if effective < LOW_BUDGET_WARNING {
            tracing::warn!(
                metadata_len,
                chunk_size,
                effective,
                "metadata leaves less than {LOW_BUDGET_WARNING} tokens per chunk"
            );
        }
        self.split_with_budget(text, effective)
    }

    /// Splits every text with the full chunk size, concatenating the results.
    ///
    /// # Errors
    /// Fails on the first text that cannot be split.
    pub fn split_texts<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>> {
        let mut chunks = Vec::new();
        for text in texts {
            chunks.extend(self.split_text(text.as_ref())?);
        }
        Ok(chunks)
    }

    /// Splits every text with its paired metadata, concatenating the results.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`] if the slices differ in length, otherwise
    /// fails on the first text that cannot be split.
    pub fn split_texts_metadata_aware<S, M>(
        &self,
        texts: &[S],
        metadata: &[M],
    ) -> Result<Vec<String>>
    where
        S: AsRef<str>,
        M: AsRef<str>,
    {
        if texts.len() != metadata.len() {
            return Err(SplitError::Configuration(format!(
                "got {} texts but {} metadata strings",
                texts.len(),
                metadata.len()
            )));
        }
        let mut chunks = Vec::new();
        for (text, metadata) in texts.iter().zip(metadata) {
            chunks.extend(self.split_text_metadata_aware(text.as_ref(), metadata.as_ref())?);
        }
        Ok(chunks)
    }

    /// The metadata rendering that costs the most room: embed or LLM view, whichever is longer.
    #[must_use]
    pub fn metadata_string(node: &Node) -> String {
        let embed = node.metadata_str(MetadataMode::Embed);
        let llm = node.metadata_str(MetadataMode::Llm);
        if embed.chars().count() > llm.chars().count() {
            embed
        } else {
            llm
        }
    }

    fn split_with_budget(&self, text: &str, budget: usize) -> Result<Vec<String>> {
        if text.is_empty() {
            return Ok(vec![String::new()]);
        }
        let callbacks = &self.options.callback_manager;
        callbacks.dispatch(&ParsingEvent::ChunkingStart {
            text_len: text.len(),
        });

        let pieces = self.splitter.split(text, budget)?;
        let overlap = self.config.chunk_overlap.min(budget - 1);
        let chunks = merge_chunks(&pieces, budget, overlap)?;
        tracing::debug!(
            pieces = pieces.len(),
            chunks = chunks.len(),
            budget,
            overlap,
            "split text into chunks"
        );

        callbacks.dispatch(&ParsingEvent::ChunkingEnd {
            chunks: chunks.len(),
        });
        Ok(chunks)
    }
}

impl NodeParser for SentenceSplitter {
    fn parse_document(&self, document: &Node) -> Result<Vec<Node>> {
        let metadata = Self::metadata_string(document);
        let chunks = self.split_text_metadata_aware(document.text(), &metadata)?;
        Ok(build_nodes_from_splits(
            chunks,
            document,
            None,
            self.options.id_generator(),
        ))
    }

    fn options(&self) -> &ParserOptions {
        &self.options
    }
}
