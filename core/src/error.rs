//! Error types for the node model and the tokenizer boundary.

use thiserror::Error;

use crate::node::NodeRelationship;

/// Errors raised by node construction, relationship access and node (de)serialization.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A relationship was stored or read with the wrong cardinality, or points at its own node.
    #[error("relationship {relationship} violated integrity: {expected}")]
    RelationshipIntegrity {
        /// Relationship kind that was accessed.
        relationship: NodeRelationship,
        /// What the caller expected to find.
        expected: &'static str,
    },

    /// The `type` tag of a serialized node is missing or not recognised.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// A serialized node lacks a field its type requires.
    #[error("{node_type} node is missing field `{field}`")]
    MissingField {
        /// Type tag of the node being decoded.
        node_type: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },

    /// JSON conversion failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by a [`Tokenizer`](crate::tokenizer::Tokenizer) implementation.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The encoding backend failed to load or to process the input.
    #[error("tokenizer backend failed: {0}")]
    Backend(#[source] anyhow::Error),

    /// A token id does not map back to text.
    #[error("invalid token id: {0}")]
    InvalidToken(u32),
}

/// Result type alias for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
