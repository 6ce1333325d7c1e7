//! Typed relationships between nodes.
//!
//! Relationships never hold a live reference to the other node. They store a
//! [`RelatedNodeInfo`] snapshot (id, metadata and hash at the time of linking),
//! so a node graph can be freely moved, cloned and serialized without cycles.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Metadata, ObjectType};
use crate::error::{NodeError, Result};

/// The kinds of edge a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRelationship {
    /// The document this node was cut from.
    Source,
    /// The preceding node of the same source.
    Previous,
    /// The following node of the same source.
    Next,
    /// The enclosing node in a hierarchy.
    Parent,
    /// Ordered children in a hierarchy.
    Child,
}

impl NodeRelationship {
    /// Returns the wire name of the relationship.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "SOURCE",
            Self::Previous => "PREVIOUS",
            Self::Next => "NEXT",
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
        }
    }

    /// Whether this relationship holds an ordered list instead of a single descriptor.
    #[must_use]
    pub const fn is_multiple(self) -> bool {
        matches!(self, Self::Child)
    }
}

impl fmt::Display for NodeRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of another node used as a relationship target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedNodeInfo {
    /// Id of the referenced node.
    pub node_id: String,
    /// Type tag of the referenced node, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<ObjectType>,
    /// Metadata of the referenced node at link time.
    #[serde(default)]
    pub metadata: Metadata,
    /// Content hash of the referenced node at link time.
    #[serde(default)]
    pub hash: String,
}

impl RelatedNodeInfo {
    /// Creates a descriptor that only knows the target id.
    #[must_use]
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: None,
            metadata: Metadata::new(),
            hash: String::new(),
        }
    }
}

/// Either one descriptor or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelatedNodeType {
    /// Single-valued relationship.
    Single(RelatedNodeInfo),
    /// Multi-valued relationship (CHILD).
    Multiple(Vec<RelatedNodeInfo>),
}

/// All relationships of a node keyed by kind.
pub type Relationships = BTreeMap<NodeRelationship, RelatedNodeType>;

pub(crate) fn single(
    relationships: &Relationships,
    relationship: NodeRelationship,
) -> Result<Option<&RelatedNodeInfo>> {
    match relationships.get(&relationship) {
        None => Ok(None),
        Some(RelatedNodeType::Single(info)) => Ok(Some(info)),
        Some(RelatedNodeType::Multiple(_)) => Err(NodeError::RelationshipIntegrity {
            relationship,
            expected: "a single related node",
        }),
    }
}

pub(crate) fn multiple(
    relationships: &Relationships,
    relationship: NodeRelationship,
) -> Result<&[RelatedNodeInfo]> {
    match relationships.get(&relationship) {
        None => Ok(&[]),
        Some(RelatedNodeType::Multiple(infos)) => Ok(infos),
        Some(RelatedNodeType::Single(_)) => Err(NodeError::RelationshipIntegrity {
            relationship,
            expected: "a list of related nodes",
        }),
    }
}

pub(crate) fn check_shape(
    owner_id: &str,
    relationship: NodeRelationship,
    related: &RelatedNodeType,
) -> Result<()> {
    let self_reference = match related {
        RelatedNodeType::Single(info) => info.node_id == owner_id,
        RelatedNodeType::Multiple(infos) => infos.iter().any(|info| info.node_id == owner_id),
    };
    if self_reference {
        return Err(NodeError::RelationshipIntegrity {
            relationship,
            expected: "a node other than itself",
        });
    }
    match (relationship.is_multiple(), related) {
        (true, RelatedNodeType::Multiple(_)) | (false, RelatedNodeType::Single(_)) => Ok(()),
        (true, RelatedNodeType::Single(_)) => Err(NodeError::RelationshipIntegrity {
            relationship,
            expected: "a list of related nodes",
        }),
        (false, RelatedNodeType::Multiple(_)) => Err(NodeError::RelationshipIntegrity {
            relationship,
            expected: "a single related node",
        }),
    }
}
