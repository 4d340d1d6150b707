use nomen_core::types::{Address, CommitmentId, LabelId, NodeId, Secret};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive a label's registry key from its UTF-8 text.
pub fn label_id(label: &str) -> LabelId {
    LabelId::from_bytes(blake3_hash(label.as_bytes()))
}

/// Derive the directory node for a label under a parent node:
/// BLAKE3(parent ‖ label id). Mirrors hierarchical namehash derivation.
pub fn subnode(parent: &NodeId, label: &LabelId) -> NodeId {
    let mut h = blake3::Hasher::new();
    h.update(parent.as_bytes());
    h.update(label.as_bytes());
    NodeId::from_bytes(*h.finalize().as_bytes())
}

/// Commitment hash binding label, intended owner and secret:
/// BLAKE3(label id ‖ owner ‖ secret).
///
/// The label is only recoverable by whoever already knows the pre-image,
/// which is the anti-front-running property the registrar relies on.
pub fn make_commitment(label: &LabelId, owner: &Address, secret: &Secret) -> CommitmentId {
    let mut h = blake3::Hasher::new();
    h.update(label.as_bytes());
    h.update(owner.as_bytes());
    h.update(&secret.0);
    CommitmentId::from_bytes(*h.finalize().as_bytes())
}
