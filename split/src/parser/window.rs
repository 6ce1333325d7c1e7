//! One node per sentence, with its neighbourhood kept in metadata.

use serde_json::Value;
use tessera_core::Node;
use tessera_core::node::build_nodes_from_splits;

use super::{NodeParser, ParserOptions};
use crate::config::SentenceWindowConfig;
use crate::error::Result;
use crate::splitting::SentenceTokenizer;

/// Splits documents into single-sentence nodes.
///
/// Every node stores the space-joined sentences within `window_size` of it on
/// either side under `window_metadata_key`, and its own sentence under
/// `original_text_metadata_key`. Both keys are hidden from embedding and
/// language-model renderings.
#[derive(Debug)]
pub struct SentenceWindowNodeParser {
    config: SentenceWindowConfig,
    sentences: SentenceTokenizer,
    options: ParserOptions,
}

impl SentenceWindowNodeParser {
    /// Creates a parser from a window configuration.
    ///
    /// # Errors
    /// Returns [`SplitError::Configuration`](crate::SplitError::Configuration) if the
    /// window size is zero or a metadata key is empty.
    pub fn new(config: SentenceWindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sentences: SentenceTokenizer::default(),
            options: ParserOptions::default(),
        })
    }

    /// Replaces the parser options.
    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SentenceWindowConfig {
        &self.config
    }
}

impl NodeParser for SentenceWindowNodeParser {
    fn parse_document(&self, document: &Node) -> Result<Vec<Node>> {
        let sentences = self.sentences.tokenize(document.text());
        let mut nodes = build_nodes_from_splits(
            sentences.iter().copied(),
            document,
            None,
            self.options.id_generator(),
        );

        let window = self.config.window_size;
        let window_key = &self.config.window_metadata_key;
        let original_key = &self.config.original_text_metadata_key;
        for (idx, node) in nodes.iter_mut().enumerate() {
            let end = (idx + window + 1).min(sentences.len());
            let joined = sentences[idx.saturating_sub(window)..end].join(" ");
            node.metadata.insert(window_key.clone(), Value::from(joined));
            node.metadata
                .insert(original_key.clone(), Value::from(sentences[idx]));
            for key in [window_key, original_key] {
                node.excluded_embed_metadata_keys.insert(key.clone());
                node.excluded_llm_metadata_keys.insert(key.clone());
            }
        }
        tracing::debug!(sentences = sentences.len(), window, "built sentence windows");
        Ok(nodes)
    }

    fn options(&self) -> &ParserOptions {
        &self.options
    }
}
