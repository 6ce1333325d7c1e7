//! Header-aware splitting of markdown documents.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tessera_core::node::build_nodes_from_splits;
use tessera_core::{Metadata, Node};

use super::{NodeParser, ParserOptions};
use crate::error::Result;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)\s(.*)").expect("header pattern is valid"));

const FENCE: &str = "```";

/// Splits markdown into one node per header section.
///
/// Each section starts at a header line outside fenced code blocks and runs up
/// to the next one. Sections carry the headers above them as `Header_1` to
/// `Header_N` metadata; a header clears every deeper level recorded before it.
/// Sections that are blank after trimming produce no node.
#[derive(Debug, Default)]
pub struct MarkdownNodeParser {
    options: ParserOptions,
}

impl MarkdownNodeParser {
    /// Creates a parser with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the parser options.
    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }
}

impl NodeParser for MarkdownNodeParser {
    fn parse_document(&self, document: &Node) -> Result<Vec<Node>> {
        let sections = sections(document.text());
        tracing::debug!(sections = sections.len(), "split markdown into sections");

        let (texts, headers): (Vec<String>, Vec<Metadata>) = sections.into_iter().unzip();
        let mut nodes = build_nodes_from_splits(texts, document, None, self.options.id_generator());
        if self.options.include_metadata {
            for (node, headers) in nodes.iter_mut().zip(headers) {
                node.metadata.extend(headers);
            }
        }
        Ok(nodes)
    }

    fn options(&self) -> &ParserOptions {
        &self.options
    }
}

/// Cuts `text` into trimmed sections paired with their header metadata.
fn sections(text: &str) -> Vec<(String, Metadata)> {
    let mut sections = Vec::new();
    let mut headers = Metadata::new();
    let mut current = String::new();
    let mut in_fence = false;

    for line in text.split('\n') {
        if line.trim().starts_with(FENCE) {
            in_fence = !in_fence;
        }
        let header = if in_fence { None } else { HEADER.captures(line) };
        let Some(header) = header else {
            current.push_str(line);
            current.push('\n');
            continue;
        };

        push_section(&mut sections, &current, &headers);
        let level = header[1].len();
        let title = &header[2];
        headers.retain(|key, _| header_level(key).is_some_and(|existing| existing < level));
        headers.insert(format!("Header_{level}"), Value::from(title));
        current = format!("{title}\n");
    }
    push_section(&mut sections, &current, &headers);
    sections
}

fn push_section(sections: &mut Vec<(String, Metadata)>, text: &str, headers: &Metadata) {
    let text = text.trim();
    if !text.is_empty() {
        sections.push((text.to_string(), headers.clone()));
    }
}

fn header_level(key: &str) -> Option<usize> {
    key.strip_prefix("Header_")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Node> {
        MarkdownNodeParser::new()
            .get_nodes_from_documents(&[Node::document(text)])
            .unwrap()
    }

    #[test]
    fn nested_headers_accumulate() {
        let nodes = parse("# A\ntext1\n## B\ntext2");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text(), "A\ntext1");
        assert_eq!(nodes[1].text(), "B\ntext2");
        assert_eq!(nodes[0].metadata.len(), 1);
        assert_eq!(nodes[0].metadata["Header_1"], "A");
        assert_eq!(nodes[1].metadata.len(), 2);
        assert_eq!(nodes[1].metadata["Header_1"], "A");
        assert_eq!(nodes[1].metadata["Header_2"], "B");
    }

    #[test]
    fn shallower_header_clears_deeper_levels() {
        let nodes = parse("# A\n## B\n### C\nbody\n## D\nmore");
        let last = nodes.last().unwrap();
        assert_eq!(last.text(), "D\nmore");
        assert_eq!(last.metadata["Header_1"], "A");
        assert_eq!(last.metadata["Header_2"], "D");
        assert!(!last.metadata.contains_key("Header_3"));
    }

    #[test]
    fn headers_inside_code_fences_are_ignored() {
        let nodes = parse("# Code\n```sh\n# not a header\n```\nafter");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), "Code\n```sh\n# not a header\n```\nafter");
        assert_eq!(nodes[0].metadata.len(), 1);
        assert_eq!(nodes[0].metadata["Header_1"], "Code");
    }

    #[test]
    fn preamble_before_first_header() {
        let nodes = parse("intro\n# A\nbody");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text(), "intro");
        assert!(nodes[0].metadata.is_empty());
        assert_eq!(nodes[1].metadata["Header_1"], "A");
    }

    #[test]
    fn hashes_without_space_are_text() {
        let nodes = parse("#tag\nplain");
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].metadata.is_empty());
    }

    #[test]
    fn blank_sections_are_skipped() {
        let nodes = parse("\n\n# A\nbody");
        assert_eq!(nodes.len(), 1);
        assert!(parse("").is_empty());
    }

    #[test]
    fn sections_are_linked_and_located() {
        let doc = Node::document("# A\nfirst\n# B\nsecond").with_metadata_entry("file", "x.md");
        let nodes = MarkdownNodeParser::new()
            .get_nodes_from_documents(std::slice::from_ref(&doc))
            .unwrap();
        assert_eq!(nodes[0].next_node().unwrap().unwrap().node_id, nodes[1].id());
        assert_eq!(nodes[1].metadata["file"], "x.md");
        assert_eq!(nodes[0].start_char_idx(), Some(2));
        assert_eq!(nodes[1].start_char_idx(), Some(12));
        assert_eq!(nodes[1].end_char_idx(), Some(20));
    }

    #[test]
    fn header_metadata_can_be_disabled() {
        let parser = MarkdownNodeParser::new()
            .with_options(ParserOptions::default().with_include_metadata(false));
        let nodes = parser.get_nodes_from_documents(&[Node::document("# A\nx")]).unwrap();
        assert!(nodes[0].metadata.is_empty());
    }
}
