//! The node graph: documents, text nodes and their relationships.
//!
//! Every unit of content is a [`Node`]. The concrete flavour (plain text, index
//! pointer, image, whole document) lives in [`NodeKind`], so behaviour is
//! selected by matching on the kind instead of through a type hierarchy.
//!
//! ```rust
//! use tessera_core::node::{MetadataMode, Node};
//!
//! let doc = Node::document("Rust is a systems language.")
//!     .with_metadata_entry("file_name", "intro.md");
//! assert_eq!(
//!     doc.content(MetadataMode::All),
//!     "file_name: intro.md\n\nRust is a systems language."
//! );
//! assert_eq!(doc.hash(), doc.clone().hash());
//! ```

mod build;
mod hash;
mod json;
mod relationship;

pub use build::{IdGenerator, build_nodes_from_splits, random_id};
pub use hash::generate_hash;
pub use relationship::{NodeRelationship, RelatedNodeInfo, RelatedNodeType, Relationships};

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NodeError, Result};

/// Key/value metadata attached to nodes. Keys render in sorted order.
pub type Metadata = BTreeMap<String, Value>;

const DEFAULT_METADATA_SEPARATOR: &str = "\n";

/// Serialized type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    /// Plain text node.
    Text,
    /// Image node (text plus image reference).
    Image,
    /// Node pointing at another index.
    Index,
    /// Whole ingested document.
    Document,
    /// Whole ingested image document.
    ImageDocument,
}

impl ObjectType {
    /// Returns the wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Index => "INDEX",
            Self::Document => "DOCUMENT",
            Self::ImageDocument => "IMAGE_DOCUMENT",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            "INDEX" => Ok(Self::Index),
            "DOCUMENT" => Ok(Self::Document),
            "IMAGE_DOCUMENT" => Ok(Self::ImageDocument),
            other => Err(NodeError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Which metadata keys take part in rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMode {
    /// Every key.
    All,
    /// Every key except `excluded_embed_metadata_keys`.
    Embed,
    /// Every key except `excluded_llm_metadata_keys`.
    Llm,
    /// No metadata at all.
    None,
}

/// Coarse modality used to route nodes to different embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModalityType {
    /// Text-only nodes.
    Text,
    /// Nodes carrying an image.
    Image,
}

/// Reference to the image carried by image nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageSource {
    /// Remote or `file://` URL.
    Url(String),
    /// Local filesystem path.
    Path(String),
    /// Inline image bytes.
    Bytes(Vec<u8>),
}

/// Kind-specific payload of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A chunk of text.
    Text,
    /// A text node that points at another index.
    Index {
        /// Id of the referenced index.
        index_id: String,
    },
    /// A text node paired with an image.
    Image {
        /// The image reference.
        image: ImageSource,
    },
    /// A whole document prior to splitting.
    Document,
    /// A whole image document prior to splitting.
    ImageDocument {
        /// The image reference.
        image: ImageSource,
    },
}

impl NodeKind {
    /// Returns the serialized type tag of this kind.
    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        match self {
            Self::Text => ObjectType::Text,
            Self::Index { .. } => ObjectType::Index,
            Self::Image { .. } => ObjectType::Image,
            Self::Document => ObjectType::Document,
            Self::ImageDocument { .. } => ObjectType::ImageDocument,
        }
    }

    /// Returns the image reference for image kinds.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageSource> {
        match self {
            Self::Image { image } | Self::ImageDocument { image } => Some(image),
            _ => None,
        }
    }

    /// Returns the modality this kind belongs to.
    #[must_use]
    pub const fn modality(&self) -> ModalityType {
        match self {
            Self::Image { .. } | Self::ImageDocument { .. } => ModalityType::Image,
            _ => ModalityType::Text,
        }
    }
}

/// A unit of content with an id, metadata, relationships and a lazily computed hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "json::NodeRecord", try_from = "json::NodeRecord")]
pub struct Node {
    id: String,
    text: String,
    kind: NodeKind,
    /// Arbitrary metadata inherited by child nodes.
    pub metadata: Metadata,
    /// Keys hidden from [`MetadataMode::Embed`] renderings.
    pub excluded_embed_metadata_keys: BTreeSet<String>,
    /// Keys hidden from [`MetadataMode::Llm`] renderings.
    pub excluded_llm_metadata_keys: BTreeSet<String>,
    relationships: Relationships,
    start_char_idx: Option<usize>,
    end_char_idx: Option<usize>,
    /// Template with `{metadata_str}` and `{content}` placeholders; empty selects the default layout.
    pub text_template: String,
    /// Separator placed between rendered metadata entries.
    pub metadata_separator: String,
    /// Precomputed embedding, carried through untouched.
    pub embedding: Option<Vec<f32>>,
    hash: OnceLock<String>,
}

impl Node {
    /// Creates a node of the given kind with a fresh random id.
    #[must_use]
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            id: random_id(),
            text: text.into(),
            kind,
            metadata: Metadata::new(),
            excluded_embed_metadata_keys: BTreeSet::new(),
            excluded_llm_metadata_keys: BTreeSet::new(),
            relationships: Relationships::new(),
            start_char_idx: None,
            end_char_idx: None,
            text_template: String::new(),
            metadata_separator: DEFAULT_METADATA_SEPARATOR.to_string(),
            embedding: None,
            hash: OnceLock::new(),
        }
    }

    /// Creates a plain text node.
    #[must_use]
    pub fn text_node(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, text)
    }

    /// Creates a document node.
    #[must_use]
    pub fn document(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Document, text)
    }

    /// Creates an index node pointing at `index_id`.
    #[must_use]
    pub fn index(text: impl Into<String>, index_id: impl Into<String>) -> Self {
        Self::new(
            NodeKind::Index {
                index_id: index_id.into(),
            },
            text,
        )
    }

    /// Creates an image node.
    #[must_use]
    pub fn image(text: impl Into<String>, image: ImageSource) -> Self {
        Self::new(NodeKind::Image { image }, text)
    }

    /// Creates an image document.
    #[must_use]
    pub fn image_document(text: impl Into<String>, image: ImageSource) -> Self {
        Self::new(NodeKind::ImageDocument { image }, text)
    }

    /// Replaces the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replaces the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Inserts a single metadata entry.
    #[must_use]
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the keys excluded from embedding renderings.
    #[must_use]
    pub fn with_excluded_embed_metadata_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_embed_metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keys excluded from language-model renderings.
    #[must_use]
    pub fn with_excluded_llm_metadata_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_llm_metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the rendering template.
    #[must_use]
    pub fn with_text_template(mut self, template: impl Into<String>) -> Self {
        self.text_template = template.into();
        self
    }

    /// Sets the metadata entry separator.
    #[must_use]
    pub fn with_metadata_separator(mut self, separator: impl Into<String>) -> Self {
        self.metadata_separator = separator.into();
        self
    }

    /// Attaches a precomputed embedding.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Adds a relationship, validating its shape.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] on a cardinality mismatch or self-reference.
    pub fn with_relationship(
        mut self,
        relationship: NodeRelationship,
        related: RelatedNodeType,
    ) -> Result<Self> {
        self.set_relationship(relationship, related)?;
        Ok(self)
    }

    /// Unique identifier of the node.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw text of the node, without metadata.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Kind-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Serialized type tag.
    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    /// Char offset of this node's text inside its source document.
    #[must_use]
    pub const fn start_char_idx(&self) -> Option<usize> {
        self.start_char_idx
    }

    /// Char offset one past the end of this node's text inside its source document.
    #[must_use]
    pub const fn end_char_idx(&self) -> Option<usize> {
        self.end_char_idx
    }

    /// All relationships keyed by kind.
    #[must_use]
    pub const fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Replaces the text and drops the cached hash.
    pub fn set_content(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalidate_hash();
    }

    /// Sets the char offsets into the source document and drops the cached hash.
    pub fn set_char_range(&mut self, start: usize, end: usize) {
        self.start_char_idx = Some(start);
        self.end_char_idx = Some(end);
        self.invalidate_hash();
    }

    /// Forgets the cached hash so the next [`Node::hash`] recomputes it.
    pub fn invalidate_hash(&mut self) {
        self.hash.take();
    }

    /// Content hash, computed on first access and cached afterwards.
    ///
    /// Metadata edits do not invalidate the cache; call [`Node::invalidate_hash`]
    /// when a fresh digest is required.
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| generate_hash(self))
    }

    pub(crate) fn seed_hash(&mut self, hash: String) {
        self.hash = OnceLock::new();
        if !hash.is_empty() {
            let _ = self.hash.set(hash);
        }
    }

    /// Stores a relationship after validating cardinality and self-reference.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the shape does not match the kind
    /// or the descriptor points at this node.
    pub fn set_relationship(
        &mut self,
        relationship: NodeRelationship,
        related: RelatedNodeType,
    ) -> Result<()> {
        relationship::check_shape(&self.id, relationship, &related)?;
        self.relationships.insert(relationship, related);
        Ok(())
    }

    /// Stores a single-valued relationship.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] for `Child` or a self-reference.
    pub fn set_related(
        &mut self,
        relationship: NodeRelationship,
        info: RelatedNodeInfo,
    ) -> Result<()> {
        self.set_relationship(relationship, RelatedNodeType::Single(info))
    }

    /// Appends a child descriptor, keeping insertion order.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if `Child` is stored as a single value
    /// or the child is this node.
    pub fn push_child(&mut self, info: RelatedNodeInfo) -> Result<()> {
        let mut children = self.child_nodes()?.to_vec();
        children.push(info);
        self.set_relationship(NodeRelationship::Child, RelatedNodeType::Multiple(children))
    }

    /// Removes a relationship, returning it if present.
    pub fn remove_relationship(
        &mut self,
        relationship: NodeRelationship,
    ) -> Option<RelatedNodeType> {
        self.relationships.remove(&relationship)
    }

    /// The document this node was cut from.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the relationship holds a list.
    pub fn source_node(&self) -> Result<Option<&RelatedNodeInfo>> {
        relationship::single(&self.relationships, NodeRelationship::Source)
    }

    /// The preceding node of the same source.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the relationship holds a list.
    pub fn prev_node(&self) -> Result<Option<&RelatedNodeInfo>> {
        relationship::single(&self.relationships, NodeRelationship::Previous)
    }

    /// The following node of the same source.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the relationship holds a list.
    pub fn next_node(&self) -> Result<Option<&RelatedNodeInfo>> {
        relationship::single(&self.relationships, NodeRelationship::Next)
    }

    /// The enclosing node.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the relationship holds a list.
    pub fn parent_node(&self) -> Result<Option<&RelatedNodeInfo>> {
        relationship::single(&self.relationships, NodeRelationship::Parent)
    }

    /// Ordered children; empty when none were recorded.
    ///
    /// # Errors
    /// Returns [`NodeError::RelationshipIntegrity`] if the relationship holds a single value.
    pub fn child_nodes(&self) -> Result<&[RelatedNodeInfo]> {
        relationship::multiple(&self.relationships, NodeRelationship::Child)
    }

    /// Snapshot of this node suitable for another node's relationship map.
    pub fn as_related_node_info(&self) -> RelatedNodeInfo {
        RelatedNodeInfo {
            node_id: self.id.clone(),
            node_type: Some(self.object_type()),
            metadata: self.metadata.clone(),
            hash: self.hash().to_string(),
        }
    }

    /// Renders the metadata visible in `mode` as `key: value` lines.
    #[must_use]
    pub fn metadata_str(&self, mode: MetadataMode) -> String {
        let excluded = match mode {
            MetadataMode::None => return String::new(),
            MetadataMode::All => None,
            MetadataMode::Embed => Some(&self.excluded_embed_metadata_keys),
            MetadataMode::Llm => Some(&self.excluded_llm_metadata_keys),
        };
        self.metadata
            .iter()
            .filter(|(key, _)| excluded.is_none_or(|set| !set.contains(*key)))
            .map(|(key, value)| format!("{key}: {}", render_value(value)))
            .collect::<Vec<_>>()
            .join(&self.metadata_separator)
    }

    /// Renders the text with the metadata visible in `mode` prefixed.
    #[must_use]
    pub fn content(&self, mode: MetadataMode) -> String {
        let metadata_str = self.metadata_str(mode);
        if !self.text_template.is_empty() {
            return self
                .text_template
                .replace("{metadata_str}", metadata_str.trim())
                .replace("{content}", &self.text);
        }
        format!("{}\n\n{}", metadata_str.trim(), self.text)
            .trim()
            .to_string()
    }

    /// Converts the node to its JSON representation.
    ///
    /// # Errors
    /// Returns [`NodeError::Serialization`] if a metadata value cannot be encoded.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a node from JSON, optionally forcing its type.
    ///
    /// # Errors
    /// Returns [`NodeError::UnknownNodeType`] when no usable type tag exists and
    /// [`NodeError::Serialization`] on malformed input.
    pub fn from_json(value: Value, node_type: Option<ObjectType>) -> Result<Self> {
        json::node_from_json(value, node_type)
    }
}

fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

/// Groups nodes by modality, preserving order within each group.
#[must_use]
pub fn split_nodes_by_type(nodes: Vec<Node>) -> BTreeMap<ModalityType, Vec<Node>> {
    let mut groups: BTreeMap<ModalityType, Vec<Node>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.kind().modality()).or_default().push(node);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Node {
        Node::text_node("body")
            .with_metadata_entry("b", "two")
            .with_metadata_entry("a", 1)
            .with_excluded_embed_metadata_keys(["b"])
            .with_excluded_llm_metadata_keys(["a"])
    }

    #[test]
    fn metadata_modes() {
        let node = sample();
        assert_eq!(node.metadata_str(MetadataMode::All), "a: 1\nb: two");
        assert_eq!(node.metadata_str(MetadataMode::Embed), "a: 1");
        assert_eq!(node.metadata_str(MetadataMode::Llm), "b: two");
        assert_eq!(node.metadata_str(MetadataMode::None), "");
    }

    #[test]
    fn content_layout() {
        let node = sample();
        assert_eq!(node.content(MetadataMode::None), "body");
        assert_eq!(node.content(MetadataMode::Embed), "a: 1\n\nbody");
    }

    #[test]
    fn template_rendering() {
        let node = sample().with_text_template("[{metadata_str}] {content}");
        assert_eq!(node.content(MetadataMode::Llm), "[b: two] body");
    }

    #[test]
    fn separator_is_respected() {
        let node = sample().with_metadata_separator(" | ");
        assert_eq!(node.metadata_str(MetadataMode::All), "a: 1 | b: two");
    }

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(Node::text_node("x").id(), Node::text_node("x").id());
    }

    #[test]
    fn clone_keeps_id_and_hash() {
        let node = sample();
        let copy = node.clone();
        assert_eq!(node.id(), copy.id());
        assert_eq!(node.hash(), copy.hash());
    }

    #[test]
    fn set_content_changes_hash() {
        let mut node = Node::text_node("before");
        let before = node.hash().to_string();
        node.set_content("after");
        assert_ne!(before, node.hash());
    }

    #[test]
    fn metadata_edit_keeps_cached_hash() {
        let mut node = Node::text_node("stable");
        let before = node.hash().to_string();
        node.metadata.insert("k".into(), json!("v"));
        assert_eq!(before, node.hash());
        node.invalidate_hash();
        assert_ne!(before, node.hash());
    }

    #[test]
    fn char_range_changes_hash() {
        let mut node = Node::text_node("span");
        let before = node.hash().to_string();
        node.set_char_range(3, 7);
        assert_ne!(before, node.hash());
        assert_eq!(node.start_char_idx(), Some(3));
        assert_eq!(node.end_char_idx(), Some(7));
    }

    #[test]
    fn relationship_accessors() {
        let doc = Node::document("whole");
        let mut node = Node::text_node("part");
        node.set_related(NodeRelationship::Source, doc.as_related_node_info())
            .unwrap();
        let source = node.source_node().unwrap().unwrap();
        assert_eq!(source.node_id, doc.id());
        assert_eq!(source.node_type, Some(ObjectType::Document));
        assert_eq!(source.hash, doc.hash());
        assert!(node.prev_node().unwrap().is_none());
        assert!(node.child_nodes().unwrap().is_empty());
    }

    #[test]
    fn children_keep_order() {
        let mut parent = Node::text_node("parent");
        parent.push_child(RelatedNodeInfo::new("c1")).unwrap();
        parent.push_child(RelatedNodeInfo::new("c2")).unwrap();
        let ids: Vec<_> = parent
            .child_nodes()
            .unwrap()
            .iter()
            .map(|info| info.node_id.as_str())
            .collect();
        assert_eq!(ids, ["c1", "c2"]);
    }

    #[test]
    fn child_cannot_be_single() {
        let mut node = Node::text_node("x");
        let err = node
            .set_related(NodeRelationship::Child, RelatedNodeInfo::new("y"))
            .unwrap_err();
        assert!(matches!(err, NodeError::RelationshipIntegrity { .. }));
    }

    #[test]
    fn node_cannot_relate_to_itself() {
        let mut node = Node::text_node("x").with_id("self");
        assert!(
            node.set_related(NodeRelationship::Next, RelatedNodeInfo::new("self"))
                .is_err()
        );
    }

    #[test]
    fn groups_by_modality() {
        let nodes = vec![
            Node::text_node("a"),
            Node::image("b", ImageSource::Url("https://example.com/b.png".into())),
            Node::index("c", "idx"),
        ];
        let groups = split_nodes_by_type(nodes);
        assert_eq!(groups[&ModalityType::Text].len(), 2);
        assert_eq!(groups[&ModalityType::Image].len(), 1);
    }

    #[test]
    fn object_type_parsing() {
        assert_eq!(
            "IMAGE_DOCUMENT".parse::<ObjectType>().unwrap(),
            ObjectType::ImageDocument
        );
        assert!(matches!(
            "VIDEO".parse::<ObjectType>(),
            Err(NodeError::UnknownNodeType(_))
        ));
    }
}
