//! nomen-directory
//!
//! Interface to the external hierarchical Name Directory the registry
//! informs of ownership and resolver changes. The registry core never
//! resolves names itself; it only writes through this trait.
//!
//! [`MemoryDirectory`] is the in-process implementation used for wiring
//! and tests.

pub mod memory;

pub use memory::MemoryDirectory;

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, LabelId, NodeId, Timestamp};

/// Write/read surface of the external Name Directory.
///
/// Implementations must apply each call atomically; a returned error means
/// nothing changed.
pub trait NameDirectory: Send + Sync {
    /// Point `label` under `parent` at `owner`. Creates the subnode if it
    /// does not exist yet.
    fn set_subnode_owner(
        &self,
        parent: &NodeId,
        label: &LabelId,
        owner: Address,
    ) -> Result<(), RegistryError>;

    /// Re-point an existing node at `owner` directly.
    fn set_node_owner(&self, node: &NodeId, owner: Address) -> Result<(), RegistryError>;

    /// Resolution owner of a node; `Address::ZERO` if the node is unset.
    fn owner(&self, node: &NodeId) -> Result<Address, RegistryError>;

    fn set_resolver(&self, node: &NodeId, resolver: Address) -> Result<(), RegistryError>;

    fn resolver(&self, node: &NodeId) -> Result<Address, RegistryError>;

    fn set_ttl(&self, node: &NodeId, ttl: Timestamp) -> Result<(), RegistryError>;

    fn ttl(&self, node: &NodeId) -> Result<Timestamp, RegistryError>;

    /// Resolved address payload of a node (the value names point at).
    fn set_addr(&self, node: &NodeId, addr: Address) -> Result<(), RegistryError>;

    fn addr(&self, node: &NodeId) -> Result<Address, RegistryError>;
}
