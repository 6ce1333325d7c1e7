//! Node parsers: turning documents into linked nodes.
//!
//! A [`NodeParser`] only has to cut one document into nodes. The provided
//! methods run it over a batch, then post-process the result: char offsets into
//! the source document, inherited metadata and PREVIOUS/NEXT links between
//! neighbours of the same source.

mod markdown;
mod sentence;
mod window;

pub use markdown::MarkdownNodeParser;
pub use sentence::SentenceSplitter;
pub use window::SentenceWindowNodeParser;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tessera_core::node::IdGenerator;
use tessera_core::{
    CallbackManager, Node, NodeError, NodeRelationship, ParsingEvent, RelatedNodeInfo, Settings,
};

use crate::error::Result;

/// Options shared by every parser.
///
/// The callback manager is captured from [`Settings`] when the options are
/// created, so work moved to other threads reports to the same handlers.
#[derive(Clone)]
pub struct ParserOptions {
    /// Merge the source document's metadata into every node.
    pub include_metadata: bool,
    /// Link neighbouring nodes of the same source with PREVIOUS/NEXT.
    pub include_prev_next_rel: bool,
    /// Receiver of parsing and chunking events.
    pub callback_manager: CallbackManager,
    /// Custom node ids; random UUIDs when unset.
    pub id_generator: Option<Arc<IdGenerator>>,
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("include_metadata", &self.include_metadata)
            .field("include_prev_next_rel", &self.include_prev_next_rel)
            .field("callback_manager", &self.callback_manager)
            .field("id_generator", &self.id_generator.is_some())
            .finish()
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            include_prev_next_rel: true,
            callback_manager: Settings::callback_manager(),
            id_generator: None,
        }
    }
}

impl ParserOptions {
    /// Enables or disables metadata inheritance.
    #[must_use]
    pub fn with_include_metadata(mut self, enabled: bool) -> Self {
        self.include_metadata = enabled;
        self
    }

    /// Enables or disables PREVIOUS/NEXT linkage.
    #[must_use]
    pub fn with_include_prev_next_rel(mut self, enabled: bool) -> Self {
        self.include_prev_next_rel = enabled;
        self
    }

    /// Replaces the callback manager.
    #[must_use]
    pub fn with_callback_manager(mut self, manager: CallbackManager) -> Self {
        self.callback_manager = manager;
        self
    }

    /// Sets the id generator used for new nodes.
    #[must_use]
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(usize, &Node) -> String + Send + Sync + 'static,
    {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    pub(crate) fn id_generator(&self) -> Option<&IdGenerator> {
        self.id_generator.as_deref()
    }
}

/// Splits documents into nodes.
pub trait NodeParser: Send + Sync {
    /// Cuts a single document into nodes, without post-processing.
    ///
    /// # Errors
    /// Returns a [`SplitError`](crate::SplitError) if the document cannot be split.
    fn parse_document(&self, document: &Node) -> Result<Vec<Node>>;

    /// Options controlling post-processing and event dispatch.
    fn options(&self) -> &ParserOptions;

    /// Cuts every document into nodes, in order, without post-processing.
    ///
    /// # Errors
    /// Fails on the first document that cannot be split.
    fn parse_nodes(&self, documents: &[Node]) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for document in documents {
            nodes.extend(self.parse_document(document)?);
        }
        Ok(nodes)
    }

    /// Parses and post-processes a batch of documents.
    ///
    /// # Errors
    /// Fails on the first document that cannot be split, or if linking produces an
    /// invalid relationship.
    fn get_nodes_from_documents(&self, documents: &[Node]) -> Result<Vec<Node>> {
        let callbacks = &self.options().callback_manager;
        callbacks.dispatch(&ParsingEvent::NodeParsingStart {
            documents: documents.len(),
        });
        let mut nodes = self.parse_nodes(documents)?;
        post_process_nodes(&mut nodes, documents, self.options())?;
        tracing::debug!(
            documents = documents.len(),
            nodes = nodes.len(),
            "parsed documents into nodes"
        );
        callbacks.dispatch(&ParsingEvent::NodeParsingEnd { nodes: nodes.len() });
        Ok(nodes)
    }

    /// Like [`NodeParser::get_nodes_from_documents`], parsing documents in parallel.
    ///
    /// Output order matches the sequential variant.
    ///
    /// # Errors
    /// Same as [`NodeParser::get_nodes_from_documents`].
    fn par_get_nodes_from_documents(&self, documents: &[Node]) -> Result<Vec<Node>> {
        let callbacks = &self.options().callback_manager;
        callbacks.dispatch(&ParsingEvent::NodeParsingStart {
            documents: documents.len(),
        });
        let parsed: Vec<Vec<Node>> = documents
            .par_iter()
            .map(|document| self.parse_document(document))
            .collect::<Result<_>>()?;
        let mut nodes: Vec<Node> = parsed.into_iter().flatten().collect();
        post_process_nodes(&mut nodes, documents, self.options())?;
        tracing::debug!(
            documents = documents.len(),
            nodes = nodes.len(),
            "parsed documents into nodes in parallel"
        );
        callbacks.dispatch(&ParsingEvent::NodeParsingEnd { nodes: nodes.len() });
        Ok(nodes)
    }
}

/// A step of an ingestion pipeline that rewrites a batch of nodes.
pub trait TransformComponent {
    /// Transforms `nodes` into a new batch.
    ///
    /// # Errors
    /// Returns a [`SplitError`](crate::SplitError) when the transform fails.
    fn transform(&self, nodes: Vec<Node>) -> Result<Vec<Node>>;
}

impl<P: NodeParser + ?Sized> TransformComponent for P {
    fn transform(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        self.get_nodes_from_documents(&nodes)
    }
}

/// Runs `nodes` through each transform in order.
///
/// # Errors
/// Stops at the first failing transform.
pub fn run_transformations(
    nodes: Vec<Node>,
    transformations: &[&dyn TransformComponent],
) -> Result<Vec<Node>> {
    transformations
        .iter()
        .try_fold(nodes, |nodes, transform| transform.transform(nodes))
}

/// Fills offsets, inherited metadata and neighbour links on freshly parsed nodes.
///
/// Offsets and metadata are settled for the whole batch before any link is made,
/// so every PREVIOUS/NEXT descriptor carries the neighbour's final hash. Offsets
/// count Unicode scalar values and point at the first occurrence of the node's
/// text in its source document.
///
/// # Errors
/// Returns [`SplitError::Node`](crate::SplitError::Node) if a node's relationships are
/// malformed.
pub fn post_process_nodes(
    nodes: &mut [Node],
    documents: &[Node],
    options: &ParserOptions,
) -> Result<()> {
    let parents: HashMap<&str, &Node> = documents
        .iter()
        .map(|document| (document.id(), document))
        .collect();
    let sources = nodes
        .iter()
        .map(|node| Ok(node.source_node()?.map(|source| source.node_id.clone())))
        .collect::<std::result::Result<Vec<Option<String>>, NodeError>>()?;

    for (node, source) in nodes.iter_mut().zip(&sources) {
        let Some(parent) = source.as_deref().and_then(|id| parents.get(id)) else {
            continue;
        };
        if let Some((start, end)) = char_span(parent.text(), node.text()) {
            node.set_char_range(start, end);
        }
        if options.include_metadata {
            for (key, value) in &parent.metadata {
                node.metadata
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
            node.invalidate_hash();
        }
    }

    if options.include_prev_next_rel {
        let infos: Vec<RelatedNodeInfo> = nodes.iter().map(Node::as_related_node_info).collect();
        let len = nodes.len();
        for (idx, node) in nodes.iter_mut().enumerate() {
            let Some(source) = &sources[idx] else {
                continue;
            };
            if idx > 0 && sources[idx - 1].as_ref() == Some(source) {
                node.set_related(NodeRelationship::Previous, infos[idx - 1].clone())?;
            }
            if idx + 1 < len && sources[idx + 1].as_ref() == Some(source) {
                node.set_related(NodeRelationship::Next, infos[idx + 1].clone())?;
            }
        }
    }
    Ok(())
}

/// Char offsets of the first occurrence of `needle` in `haystack`.
fn char_span(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let byte_start = haystack.find(needle)?;
    let start = haystack[..byte_start].chars().count();
    Some((start, start + needle.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tessera_core::CharTokenizer;

    use crate::config::SentenceSplitterConfig;

    fn splitter(options: ParserOptions) -> SentenceSplitter {
        let config = SentenceSplitterConfig::builder()
            .chunk_size(12)
            .chunk_overlap(0)
            .build()
            .unwrap();
        SentenceSplitter::new(config)
            .unwrap()
            .with_tokenizer(Arc::new(CharTokenizer))
            .with_options(options)
    }

    #[test]
    fn char_span_counts_scalars() {
        assert_eq!(char_span("héllo wörld", "wörld"), Some((6, 11)));
        assert_eq!(char_span("abc", "zz"), None);
    }

    #[test]
    fn nodes_are_linked_within_a_document() {
        let doc = Node::document("One two. Three four. Five six.");
        let nodes = splitter(ParserOptions::default())
            .get_nodes_from_documents(std::slice::from_ref(&doc))
            .unwrap();
        assert_eq!(nodes.len(), 3);

        assert!(nodes[0].prev_node().unwrap().is_none());
        assert_eq!(nodes[0].next_node().unwrap().unwrap().node_id, nodes[1].id());
        assert_eq!(nodes[1].prev_node().unwrap().unwrap().node_id, nodes[0].id());
        assert_eq!(nodes[1].next_node().unwrap().unwrap().node_id, nodes[2].id());
        assert!(nodes[2].next_node().unwrap().is_none());
        assert_eq!(
            nodes[2].prev_node().unwrap().unwrap().hash,
            nodes[1].hash()
        );
    }

    #[test]
    fn links_stop_at_document_boundaries() {
        let docs = [
            Node::document("First doc one. First doc two."),
            Node::document("Second doc."),
        ];
        let nodes = splitter(ParserOptions::default())
            .get_nodes_from_documents(&docs)
            .unwrap();
        let last_of_first = nodes
            .iter()
            .rposition(|node| node.source_node().unwrap().unwrap().node_id == docs[0].id())
            .unwrap();
        assert!(nodes[last_of_first].next_node().unwrap().is_none());
        assert!(nodes[last_of_first + 1].prev_node().unwrap().is_none());
    }

    #[test]
    fn offsets_point_into_the_source() {
        let doc = Node::document("Alpha beta. Gamma delta.");
        let nodes = splitter(ParserOptions::default())
            .get_nodes_from_documents(std::slice::from_ref(&doc))
            .unwrap();
        for node in &nodes {
            let start = node.start_char_idx().unwrap();
            let end = node.end_char_idx().unwrap();
            let span: String = doc.text().chars().skip(start).take(end - start).collect();
            assert_eq!(span, node.text());
        }
    }

    #[test]
    fn node_metadata_wins_over_document_metadata() {
        let doc = Node::document("Short.")
            .with_metadata_entry("lang", "en")
            .with_metadata_entry("page", 1);
        let mut nodes = splitter(ParserOptions::default())
            .parse_nodes(std::slice::from_ref(&doc))
            .unwrap();
        nodes[0].metadata.insert("page".into(), serde_json::json!(7));
        post_process_nodes(&mut nodes, std::slice::from_ref(&doc), &ParserOptions::default())
            .unwrap();
        assert_eq!(nodes[0].metadata["lang"], "en");
        assert_eq!(nodes[0].metadata["page"], 7);
    }

    #[test]
    fn options_disable_metadata_and_links() {
        let doc = Node::document("One two. Three four.").with_metadata_entry("k", "v");
        let options = ParserOptions::default()
            .with_include_metadata(false)
            .with_include_prev_next_rel(false);
        let nodes = splitter(options)
            .get_nodes_from_documents(std::slice::from_ref(&doc))
            .unwrap();
        assert!(nodes.len() > 1);
        for node in &nodes {
            assert!(node.metadata.is_empty());
            assert!(node.prev_node().unwrap().is_none());
            assert!(node.next_node().unwrap().is_none());
        }
    }

    #[test]
    fn parsing_events_are_dispatched() {
        let manager = CallbackManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.on(move |event| sink.lock().unwrap().push(*event));

        let doc = Node::document("One two. Three four.");
        let options = ParserOptions::default().with_callback_manager(manager);
        let nodes = splitter(options)
            .get_nodes_from_documents(std::slice::from_ref(&doc))
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.first(),
            Some(&ParsingEvent::NodeParsingStart { documents: 1 })
        );
        assert_eq!(
            seen.last(),
            Some(&ParsingEvent::NodeParsingEnd { nodes: nodes.len() })
        );
        assert!(seen.contains(&ParsingEvent::ChunkingStart { text_len: 20 }));
    }

    #[test]
    fn parallel_matches_sequential() {
        let docs: Vec<Node> = (0..8)
            .map(|idx| {
                Node::document(format!("Doc {idx} first. Doc {idx} second. Doc {idx} third."))
                    .with_id(format!("doc-{idx}"))
            })
            .collect();
        let options = ParserOptions::default()
            .with_id_generator(|idx, doc: &Node| format!("{}#{idx}", doc.id()));
        let parser = splitter(options);
        let sequential = parser.get_nodes_from_documents(&docs).unwrap();
        let parallel = parser.par_get_nodes_from_documents(&docs).unwrap();

        assert_eq!(sequential.len(), parallel.len());
        for (left, right) in sequential.iter().zip(&parallel) {
            assert_eq!(left.id(), right.id());
            assert_eq!(left.text(), right.text());
            assert_eq!(left.hash(), right.hash());
        }
    }

    #[test]
    fn parsers_compose_as_transforms() {
        let config = SentenceSplitterConfig::builder()
            .chunk_size(40)
            .chunk_overlap(0)
            .build()
            .unwrap();
        let splitter = SentenceSplitter::new(config)
            .unwrap()
            .with_tokenizer(Arc::new(CharTokenizer));
        let markdown = MarkdownNodeParser::new();
        let docs = vec![Node::document("# Title\nOne two. Three four.")];
        let nodes = run_transformations(docs, &[&markdown, &splitter]).unwrap();
        assert!(nodes.len() > 1);
        assert!(nodes.iter().all(|node| node.metadata["Header_1"] == "Title"));
    }
}
