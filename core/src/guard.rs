//! Opt-in truncation of rendered node content.

use std::env;

use crate::node::{MetadataMode, Node};
use crate::settings::Settings;

/// Environment variable that enables the guard when set to `true`.
pub const CHUNK_SIZE_CHECK_ENV: &str = "ENABLE_CHUNK_SIZE_CHECK";

/// Caps rendered node content at the configured chunk size.
///
/// The limit is read from [`Settings::chunk_size`] at call time and counted in
/// characters. A disabled guard, or an unset chunk size, passes content through
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkSizeGuard {
    enabled: bool,
}

impl ChunkSizeGuard {
    /// Creates a guard that is explicitly on or off.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enables the guard when `ENABLE_CHUNK_SIZE_CHECK` is exactly `true`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env::var(CHUNK_SIZE_CHECK_ENV).is_ok_and(|value| value == "true"))
    }

    /// Whether truncation is active.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.enabled
    }

    /// Renders `node` in `mode`, truncated to the chunk size when enabled.
    #[must_use]
    pub fn content(self, node: &Node, mode: MetadataMode) -> String {
        let content = node.content(mode);
        if !self.enabled {
            return content;
        }
        let Some(limit) = Settings::chunk_size() else {
            return content;
        };
        match content.char_indices().nth(limit) {
            Some((cut, _)) => {
                tracing::warn!(
                    node_id = node.id(),
                    chars = content.chars().count(),
                    limit,
                    "node content exceeds chunk size, truncating"
                );
                content[..cut].to_string()
            }
            None => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_guard_passes_through() {
        let node = Node::text_node("0123456789");
        let rendered = Settings::with_chunk_size(Some(3), || {
            ChunkSizeGuard::new(false).content(&node, MetadataMode::None)
        });
        assert_eq!(rendered, "0123456789");
    }

    #[test]
    fn enabled_guard_truncates_by_chars() {
        let node = Node::text_node("héllo wörld");
        let rendered = Settings::with_chunk_size(Some(4), || {
            ChunkSizeGuard::new(true).content(&node, MetadataMode::None)
        });
        assert_eq!(rendered, "héll");
    }

    #[test]
    fn short_content_is_untouched() {
        let node = Node::text_node("abc");
        let rendered = Settings::with_chunk_size(Some(3), || {
            ChunkSizeGuard::new(true).content(&node, MetadataMode::None)
        });
        assert_eq!(rendered, "abc");
    }

    #[test]
    fn unset_chunk_size_disables_truncation() {
        let node = Node::text_node("abcdef");
        let rendered = Settings::with_chunk_size(None, || {
            ChunkSizeGuard::new(true).content(&node, MetadataMode::None)
        });
        assert_eq!(rendered, "abcdef");
    }

    #[test]
    fn metadata_counts_toward_the_limit() {
        let node = Node::text_node("body").with_metadata_entry("k", "v");
        let rendered = Settings::with_chunk_size(Some(6), || {
            ChunkSizeGuard::new(true).content(&node, MetadataMode::All)
        });
        assert_eq!(rendered, "k: v\n\n");
    }
}
