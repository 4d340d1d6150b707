//! nomen-crypto
//!
//! One-way hashes the registry is built on: label identifiers, directory
//! node derivation, and the commit-reveal commitment hash. All BLAKE3.

pub mod hash;

pub use hash::{label_id, make_commitment, subnode};
