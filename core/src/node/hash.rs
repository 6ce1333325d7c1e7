//! SHA-256 content hashing.
//!
//! The id is not part of the digest: two nodes with the same type, offsets and
//! rendered content hash identically no matter where they came from.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use super::{ImageSource, MetadataMode, Node};

/// Computes the content hash of `node` without touching its cache.
#[must_use]
pub fn generate_hash(node: &Node) -> String {
    let text_digest = text_digest(node);
    match node.kind().image() {
        Some(image) => {
            let mut hasher = Sha256::new();
            hasher.update(text_digest.as_bytes());
            hasher.update(image_digest(image).as_bytes());
            STANDARD.encode(hasher.finalize())
        }
        None => text_digest,
    }
}

fn text_digest(node: &Node) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("type={}", node.object_type()));
    hasher.update(format!(
        "startCharIdx={} endCharIdx={}",
        offset(node.start_char_idx()),
        offset(node.end_char_idx())
    ));
    hasher.update(node.content(MetadataMode::All));
    STANDARD.encode(hasher.finalize())
}

fn image_digest(image: &ImageSource) -> String {
    let mut hasher = Sha256::new();
    match image {
        ImageSource::Url(url) => hasher.update(url.as_bytes()),
        ImageSource::Path(path) => hasher.update(path.as_bytes()),
        ImageSource::Bytes(bytes) => hasher.update(bytes),
    }
    STANDARD.encode(hasher.finalize())
}

fn offset(value: Option<usize>) -> String {
    value.map_or_else(|| "none".to_string(), |idx| idx.to_string())
}
