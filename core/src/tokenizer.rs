//! Tokenizer boundary.
//!
//! The chunking engine only needs to count tokens, but the trait also exposes
//! `decode` so callers can trim text to a token budget themselves. Implementations
//! must be immutable or internally synchronized: one instance is shared across
//! every document being split.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

use crate::error::TokenizerError;

/// Converts text to a countable token sequence and back.
pub trait Tokenizer: Send + Sync {
    /// Encodes `text` into token ids.
    ///
    /// # Errors
    /// Returns [`TokenizerError`] if the backend cannot encode the input.
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decodes token ids back into text.
    ///
    /// # Errors
    /// Returns [`TokenizerError`] if a token id is not part of the vocabulary.
    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;

    /// Counts the tokens in `text`.
    ///
    /// # Errors
    /// Propagates [`Tokenizer::encode`] failures.
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        self.encode(text).map(|tokens| tokens.len())
    }

    /// Returns the name of this tokenizer.
    fn name(&self) -> &'static str;
}

/// BPE tokenizer using the `cl100k_base` encoding.
///
/// The vocabulary is loaded on first use and shared by every clone of the
/// process; a load failure surfaces as [`TokenizerError::Backend`] from each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cl100kTokenizer;

impl Cl100kTokenizer {
    /// Creates the tokenizer. The vocabulary loads lazily.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn bpe() -> Result<&'static CoreBPE, TokenizerError> {
        static BPE: OnceLock<Result<CoreBPE, String>> = OnceLock::new();
        BPE.get_or_init(|| tiktoken_rs::cl100k_base().map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|message| TokenizerError::Backend(anyhow::anyhow!(message.clone())))
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let bpe = Self::bpe()?;
        Ok(bpe.encode_with_special_tokens(text))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        let bpe = Self::bpe()?;
        bpe.decode(tokens.to_vec()).map_err(TokenizerError::Backend)
    }

    fn name(&self) -> &'static str {
        "cl100k_base"
    }
}

/// Deterministic tokenizer that emits one token per Unicode scalar value.
///
/// Token counts are additive under concatenation, which makes budgets easy to
/// reason about in tests and for character-budgeted pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        tokens
            .iter()
            .map(|&token| char::from_u32(token).ok_or(TokenizerError::InvalidToken(token)))
            .collect()
    }

    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.chars().count())
    }

    fn name(&self) -> &'static str {
        "char"
    }
}
