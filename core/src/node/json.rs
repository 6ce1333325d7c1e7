//! Stable JSON shape of a node.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ImageSource, Metadata, Node, NodeKind, ObjectType, Relationships, random_id};
use crate::error::{NodeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeRecord {
    #[serde(rename = "id_", default)]
    id: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    excluded_embed_metadata_keys: BTreeSet<String>,
    #[serde(default)]
    excluded_llm_metadata_keys: BTreeSet<String>,
    #[serde(default)]
    relationships: Relationships,
    #[serde(default)]
    hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_char_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_char_idx: Option<usize>,
    #[serde(default)]
    text_template: String,
    #[serde(default = "default_separator")]
    metadata_separator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<ImageSource>,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
}

fn default_separator() -> String {
    super::DEFAULT_METADATA_SEPARATOR.to_string()
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let hash = node.hash().to_string();
        let node_type = Some(node.object_type().as_str().to_string());
        let (index_id, image) = match node.kind {
            NodeKind::Index { index_id } => (Some(index_id), None),
            NodeKind::Image { image } | NodeKind::ImageDocument { image } => (None, Some(image)),
            NodeKind::Text | NodeKind::Document => (None, None),
        };
        Self {
            id: Some(node.id),
            text: node.text,
            metadata: node.metadata,
            excluded_embed_metadata_keys: node.excluded_embed_metadata_keys,
            excluded_llm_metadata_keys: node.excluded_llm_metadata_keys,
            relationships: node.relationships,
            hash,
            start_char_idx: node.start_char_idx,
            end_char_idx: node.end_char_idx,
            text_template: node.text_template,
            metadata_separator: node.metadata_separator,
            embedding: node.embedding,
            index_id,
            image,
            node_type,
        }
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = NodeError;

    fn try_from(record: NodeRecord) -> Result<Self> {
        let node_type: ObjectType = record
            .node_type
            .as_deref()
            .ok_or_else(|| NodeError::UnknownNodeType("<missing>".to_string()))?
            .parse()?;
        let missing_image = || NodeError::MissingField {
            node_type: node_type.as_str(),
            field: "image",
        };
        let kind = match node_type {
            ObjectType::Text => NodeKind::Text,
            ObjectType::Document => NodeKind::Document,
            ObjectType::Index => NodeKind::Index {
                index_id: record.index_id.unwrap_or_default(),
            },
            ObjectType::Image => NodeKind::Image {
                image: record.image.ok_or_else(missing_image)?,
            },
            ObjectType::ImageDocument => NodeKind::ImageDocument {
                image: record.image.ok_or_else(missing_image)?,
            },
        };
        let mut node = Self {
            id: record.id.unwrap_or_else(random_id),
            text: record.text,
            kind,
            metadata: record.metadata,
            excluded_embed_metadata_keys: record.excluded_embed_metadata_keys,
            excluded_llm_metadata_keys: record.excluded_llm_metadata_keys,
            relationships: record.relationships,
            start_char_idx: record.start_char_idx,
            end_char_idx: record.end_char_idx,
            text_template: record.text_template,
            metadata_separator: record.metadata_separator,
            embedding: record.embedding,
            hash: OnceLock::new(),
        };
        node.seed_hash(record.hash);
        Ok(node)
    }
}

pub(crate) fn node_from_json(mut value: Value, node_type: Option<ObjectType>) -> Result<Node> {
    if let (Some(node_type), Value::Object(map)) = (node_type, &mut value) {
        map.insert("type".into(), Value::String(node_type.as_str().to_string()));
    }
    let record: NodeRecord = serde_json::from_value(value)?;
    Node::try_from(record)
}
