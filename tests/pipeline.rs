//! End-to-end behaviour of the node parsing pipeline.

use std::sync::{Arc, Mutex};

use tessera::{
    CallbackManager, CharTokenizer, ChunkSizeGuard, Cl100kTokenizer, MarkdownNodeParser,
    MetadataMode, Node, NodeParser, NodeRelationship, ObjectType, ParsingEvent, SentenceSplitter,
    SentenceSplitterConfig, Settings, SplitError, Tokenizer,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn splitter(
    chunk_size: usize,
    chunk_overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
) -> SentenceSplitter {
    let config = SentenceSplitterConfig::builder()
        .chunk_size(chunk_size)
        .chunk_overlap(chunk_overlap)
        .build()
        .unwrap();
    SentenceSplitter::new(config).unwrap().with_tokenizer(tokenizer)
}

#[test]
fn long_paragraph_is_split_recursively_with_overlap() {
    init_tracing();
    let text = "Para one.\n\n\nPara two is much longer than the configured chunk size and must be \
                recursively split into smaller pieces that still respect the token budget of five \
                tokens with an overlap of two tokens.";
    let tokenizer = Cl100kTokenizer::new();
    let chunks = splitter(5, 2, Arc::new(tokenizer)).split_text(text).unwrap();

    assert!(chunks.len() >= 3, "{chunks:?}");
    for chunk in &chunks {
        assert!(tokenizer.count(chunk).unwrap() <= 5, "{chunk:?} is over budget");
    }
    for pair in chunks.windows(2).skip(1) {
        assert!(shared_words(&pair[0], &pair[1]) > 0, "{pair:?} share no overlap");
    }
}

/// Number of trailing words of `left` that open `right`.
fn shared_words(left: &str, right: &str) -> usize {
    let left: Vec<_> = left.split_whitespace().collect();
    let right: Vec<_> = right.split_whitespace().collect();
    (1..=left.len().min(right.len()))
        .rev()
        .find(|&k| left[left.len() - k..] == right[..k])
        .unwrap_or(0)
}

#[test]
fn metadata_as_long_as_the_chunk_is_rejected() {
    let doc = Node::document("Some text.").with_metadata_entry("title", "a rather long title");
    let err = splitter(10, 0, Arc::new(CharTokenizer))
        .get_nodes_from_documents(&[doc])
        .unwrap_err();
    assert!(matches!(err, SplitError::Configuration(_)));
}

#[test]
fn markdown_headers_become_metadata() {
    let nodes = MarkdownNodeParser::new()
        .get_nodes_from_documents(&[Node::document("# A\ntext1\n## B\ntext2")])
        .unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        serde_json::to_value(&nodes[0].metadata).unwrap(),
        serde_json::json!({ "Header_1": "A" })
    );
    assert_eq!(
        serde_json::to_value(&nodes[1].metadata).unwrap(),
        serde_json::json!({ "Header_1": "A", "Header_2": "B" })
    );
}

#[test]
fn every_node_links_to_its_neighbours() {
    let text = (1..=12)
        .map(|idx| format!("Sentence number {idx} is here."))
        .collect::<Vec<_>>()
        .join(" ");
    let doc = Node::document(text);
    let nodes = splitter(40, 0, Arc::new(CharTokenizer))
        .get_nodes_from_documents(std::slice::from_ref(&doc))
        .unwrap();
    let count = nodes.len();
    assert!(count > 3);

    assert!(nodes[0].prev_node().unwrap().is_none());
    assert!(nodes[count - 1].next_node().unwrap().is_none());
    for idx in 1..count - 1 {
        let prev = nodes[idx].prev_node().unwrap().unwrap();
        let next = nodes[idx].next_node().unwrap().unwrap();
        assert_eq!(prev, &nodes[idx - 1].as_related_node_info());
        assert_eq!(next, &nodes[idx + 1].as_related_node_info());
    }
    for node in &nodes {
        assert_eq!(node.source_node().unwrap().unwrap().node_id, doc.id());
        assert!(node.text().chars().count() <= 40);
    }
}

#[test]
fn hashes_are_deterministic() {
    let first = Node::text_node("same content").with_metadata_entry("k", "v");
    let second = Node::text_node("same content").with_metadata_entry("k", "v");
    assert_ne!(first.id(), second.id());
    assert_eq!(first.hash(), second.hash());

    let mut changed = first.clone();
    changed.set_content("other content");
    assert_ne!(changed.hash(), first.hash());

    let mut moved = first.clone();
    moved.set_char_range(3, 15);
    assert_ne!(moved.hash(), first.hash());
}

#[test]
fn nodes_serialize_to_the_stable_json_shape() {
    let doc = Node::document("Alpha beta. Gamma delta.").with_id("doc-1");
    let nodes = splitter(12, 0, Arc::new(CharTokenizer))
        .get_nodes_from_documents(&[doc])
        .unwrap();
    let json = nodes[1].to_json().unwrap();

    assert_eq!(json["type"], "TEXT");
    assert_eq!(json["id_"], nodes[1].id());
    assert_eq!(json["text"], "Gamma delta.");
    assert_eq!(json["startCharIdx"], 12);
    assert_eq!(json["endCharIdx"], 24);
    assert_eq!(json["hash"], nodes[1].hash());
    assert_eq!(json["relationships"]["SOURCE"]["nodeId"], "doc-1");
    assert_eq!(json["relationships"]["PREVIOUS"]["nodeId"], nodes[0].id());

    let restored = Node::from_json(json, None).unwrap();
    assert_eq!(restored.object_type(), ObjectType::Text);
    assert_eq!(restored.hash(), nodes[1].hash());
    assert_eq!(
        restored.relationships().get(&NodeRelationship::Source),
        nodes[1].relationships().get(&NodeRelationship::Source)
    );
}

#[test]
fn guard_truncates_rendered_content_to_the_settings_chunk_size() {
    let node = Node::text_node("0123456789");
    let guard = ChunkSizeGuard::new(true);
    let truncated = Settings::with_chunk_size(Some(4), || guard.content(&node, MetadataMode::None));
    assert_eq!(truncated, "0123");
    assert_eq!(node.text(), "0123456789");
}

#[test]
fn parallel_parsing_reports_to_the_scoped_callback_manager() {
    let manager = CallbackManager::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.on(move |event| sink.lock().unwrap().push(*event));

    let config = SentenceSplitterConfig::builder()
        .chunk_size(16)
        .chunk_overlap(0)
        .build()
        .unwrap();
    let parser = Settings::with_callback_manager(manager, || {
        SentenceSplitter::new(config)
            .unwrap()
            .with_tokenizer(Arc::new(CharTokenizer))
    });
    let docs: Vec<Node> = (0..6)
        .map(|idx| Node::document(format!("Doc {idx} one. Doc {idx} two.")))
        .collect();
    let nodes = parser.par_get_nodes_from_documents(&docs).unwrap();

    let seen = seen.lock().unwrap();
    let chunking_starts = seen
        .iter()
        .filter(|event| matches!(event, ParsingEvent::ChunkingStart { .. }))
        .count();
    assert_eq!(chunking_starts, docs.len());
    assert_eq!(
        seen.last(),
        Some(&ParsingEvent::NodeParsingEnd { nodes: nodes.len() })
    );
}
