//! Error types for splitting and node parsing.

use tessera_core::NodeError;
use thiserror::Error;

/// Errors that can occur while splitting text or parsing documents into nodes.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Invalid splitter settings, or a per-document budget that leaves no room for text.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A piece that no splitting function can subdivide still exceeds the budget.
    #[error("indivisible unit of {token_size} tokens exceeds the budget of {budget} tokens")]
    IndivisibleUnit {
        /// Token size of the offending piece.
        token_size: usize,
        /// Budget it had to fit into.
        budget: usize,
    },

    /// Building or linking nodes failed.
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Result type alias for splitting operations.
pub type Result<T> = std::result::Result<T, SplitError>;
