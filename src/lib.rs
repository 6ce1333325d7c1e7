//! # tessera
//!
//! High level façade crate that re-exports [`tessera_core`] and [`tessera_split`].
//! Pull this crate in to turn raw documents into ordered, linked, token-budgeted
//! nodes ready for embedding and retrieval.
//!
//! ## What's inside?
//!
//! - [`Node`] with typed relationships, lazily cached content hashes and JSON output.
//! - [`SentenceSplitter`], a recursive splitter that keeps paragraphs and sentences
//!   whole where the budget allows and overlaps neighbouring chunks.
//! - [`MarkdownNodeParser`] and [`SentenceWindowNodeParser`] for header-aware and
//!   sentence-window strategies.
//! - Process-wide [`Settings`] with scoped overrides, and lifecycle events through
//!   [`CallbackManager`].
//!
//! ## Example
//!
//! ```rust
//! use tessera::{Node, NodeParser, SentenceSplitter, SentenceSplitterConfig};
//!
//! let config = SentenceSplitterConfig::builder()
//!     .chunk_size(64)
//!     .chunk_overlap(8)
//!     .build()?;
//! let splitter = SentenceSplitter::new(config)?;
//! let doc = Node::document("Tessera cuts documents into nodes. Each node knows its neighbours.")
//!     .with_metadata_entry("file_name", "intro.txt");
//!
//! let nodes = splitter.get_nodes_from_documents(&[doc])?;
//! for node in &nodes {
//!     assert_eq!(node.metadata["file_name"], "intro.txt");
//! }
//! # Ok::<(), tessera::SplitError>(())
//! ```
//!
//! ## Modules
//!
//! - [`tessera_core::node`]: nodes, relationships, hashing and serialization.
//! - [`tessera_core::settings`]: global defaults and scoped overrides.
//! - [`tessera_split::splitting`]: primitive splitting functions and sentence tokenization.
//! - [`tessera_split::parser`]: node parsers and post-processing.

pub use tessera_core::*;
pub use tessera_split::{
    Chunk, MarkdownNodeParser, NodeParser, ParserOptions, RecursiveSplitter, SentenceSplitter,
    SentenceSplitterConfig, SentenceSplitterConfigBuilder, SentenceWindowConfig,
    SentenceWindowNodeParser, SplitError, TransformComponent, config, merge, merge_chunks, parser,
    post_process_nodes, run_transformations, split_sentences, splitter, splitting,
};
