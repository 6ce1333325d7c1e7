//! # tessera-core
//!
//! The data model shared by every tessera crate: [`Node`]s and their typed
//! relationships, content hashing, the [`Tokenizer`] boundary, process-wide
//! [`Settings`] and the parsing lifecycle [`callbacks`].
//!
//! Splitting text into nodes lives in `tessera-split`; this crate only knows
//! what a node is and how it renders, hashes and serializes.
//!
//! ```rust
//! use tessera_core::node::{MetadataMode, Node, NodeRelationship};
//!
//! let doc = Node::document("Hello there.").with_metadata_entry("author", "ana");
//! let mut chunk = Node::text_node("Hello there.");
//! chunk
//!     .set_related(NodeRelationship::Source, doc.as_related_node_info())
//!     .unwrap();
//!
//! assert_eq!(chunk.source_node().unwrap().unwrap().node_id, doc.id());
//! assert_eq!(doc.metadata_str(MetadataMode::All), "author: ana");
//! ```

pub mod callbacks;
pub mod error;
pub mod guard;
pub mod node;
pub mod settings;
pub mod tokenizer;

pub use callbacks::{CallbackManager, HandlerId, ParsingEvent};
pub use error::{NodeError, Result, TokenizerError};
pub use guard::ChunkSizeGuard;
pub use node::{
    ImageSource, Metadata, MetadataMode, ModalityType, Node, NodeKind, NodeRelationship,
    ObjectType, RelatedNodeInfo, RelatedNodeType, Relationships,
};
pub use settings::Settings;
pub use tokenizer::{CharTokenizer, Cl100kTokenizer, Tokenizer};
