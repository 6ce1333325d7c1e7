//! Turning text splits into nodes.

use uuid::Uuid;

use super::{Node, NodeKind, NodeRelationship, RelatedNodeType, Relationships};

/// Produces the id of the `n`-th node cut from a document.
pub type IdGenerator = dyn Fn(usize, &Node) -> String + Send + Sync;

/// Returns a random UUID v4 string.
#[must_use]
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds one node per split, each pointing at `ref_doc` (or `doc`) as its SOURCE.
///
/// Image documents produce image nodes carrying the same image; every other kind
/// produces text nodes. Excluded key sets, template, separator and embedding are
/// copied from `doc`; metadata is left for the parser's post-processing.
pub fn build_nodes_from_splits<I, S>(
    splits: I,
    doc: &Node,
    ref_doc: Option<&Node>,
    id_generator: Option<&IdGenerator>,
) -> Vec<Node>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ref_doc = ref_doc.unwrap_or(doc);
    let mut relationships = Relationships::new();
    relationships.insert(
        NodeRelationship::Source,
        RelatedNodeType::Single(ref_doc.as_related_node_info()),
    );

    splits
        .into_iter()
        .enumerate()
        .map(|(idx, text)| {
            let kind = match doc.kind() {
                NodeKind::ImageDocument { image } => NodeKind::Image {
                    image: image.clone(),
                },
                _ => NodeKind::Text,
            };
            let mut node = Node::new(kind, text);
            if let Some(generate) = id_generator {
                node.id = generate(idx, doc);
            }
            node.excluded_embed_metadata_keys = doc.excluded_embed_metadata_keys.clone();
            node.excluded_llm_metadata_keys = doc.excluded_llm_metadata_keys.clone();
            node.metadata_separator = doc.metadata_separator.clone();
            node.text_template = doc.text_template.clone();
            node.embedding = doc.embedding.clone();
            node.relationships = relationships.clone();
            node
        })
        .collect()
}
