use sha2::{Digest, Sha256};

/// Generate the content address of a `(source, dest)` request.
///
/// SHA256 over the plain concatenation of both nodes, hex encoded. The same
/// pair always maps to the same id, so re-deriving an edge request collapses
/// onto the existing frontier row. Direction matters: `(a, b)` and `(b, a)`
/// are different requests.
pub fn generate_id(source_node: &str, dest_node: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_node.as_bytes());
    hasher.update(dest_node.as_bytes());
    format!("{:x}", hasher.finalize())
}
