//! Token-budgeted text splitting and node parsing.
//!
//! The crate turns documents into ordered, linked, size-bounded nodes:
//! - [`splitting`] holds the primitive splitting functions and the sentence tokenizer.
//! - [`RecursiveSplitter`] breaks text into pieces that each fit a token budget,
//!   trying paragraphs, sentences, clauses, words and finally characters.
//! - [`merge_chunks`] packs those pieces back into overlapping chunks.
//! - The [`NodeParser`] implementations ([`SentenceSplitter`], [`MarkdownNodeParser`]
//!   and [`SentenceWindowNodeParser`]) wrap the above and post-process the
//!   resulting nodes with offsets, inherited metadata and neighbour links.
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_core::{CharTokenizer, Node};
//! use tessera_split::{NodeParser, SentenceSplitter, SentenceSplitterConfig};
//!
//! let config = SentenceSplitterConfig::builder()
//!     .chunk_size(24)
//!     .chunk_overlap(0)
//!     .build()?;
//! let parser = SentenceSplitter::new(config)?.with_tokenizer(Arc::new(CharTokenizer));
//! let doc = Node::document("The first sentence. The second sentence.");
//! let nodes = parser.get_nodes_from_documents(&[doc])?;
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(nodes[1].prev_node()?.map(|info| info.node_id.as_str()), Some(nodes[0].id()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod parser;
pub mod splitter;
pub mod splitting;

pub use config::{SentenceSplitterConfig, SentenceSplitterConfigBuilder, SentenceWindowConfig};
pub use error::{Result, SplitError};
pub use merge::merge_chunks;
pub use parser::{
    MarkdownNodeParser, NodeParser, ParserOptions, SentenceSplitter, SentenceWindowNodeParser,
    TransformComponent, post_process_nodes, run_transformations,
};
pub use splitter::{Chunk, RecursiveSplitter};
pub use splitting::split_sentences;
