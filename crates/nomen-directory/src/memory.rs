use std::collections::HashMap;
use std::sync::RwLock;

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, LabelId, NodeId, Timestamp};
use nomen_crypto::subnode;

use crate::NameDirectory;

#[derive(Clone, Debug, Default)]
struct NodeEntry {
    owner: Address,
    resolver: Address,
    ttl: Timestamp,
    addr: Address,
}

/// In-memory Name Directory for wiring and tests.
pub struct MemoryDirectory {
    nodes: RwLock<HashMap<NodeId, NodeEntry>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self { nodes: RwLock::new(HashMap::new()) }
    }

    fn read<T>(&self, node: &NodeId, f: impl Fn(&NodeEntry) -> T, default: T) -> Result<T, RegistryError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(nodes.get(node).map(f).unwrap_or(default))
    }

    fn write(&self, node: &NodeId, f: impl FnOnce(&mut NodeEntry)) -> Result<(), RegistryError> {
        let mut nodes = self
            .nodes
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        f(nodes.entry(*node).or_default());
        Ok(())
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl NameDirectory for MemoryDirectory {
    fn set_subnode_owner(
        &self,
        parent: &NodeId,
        label: &LabelId,
        owner: Address,
    ) -> Result<(), RegistryError> {
        let node = subnode(parent, label);
        self.write(&node, |entry| entry.owner = owner)
    }

    fn set_node_owner(&self, node: &NodeId, owner: Address) -> Result<(), RegistryError> {
        self.write(node, |entry| entry.owner = owner)
    }

    fn owner(&self, node: &NodeId) -> Result<Address, RegistryError> {
        self.read(node, |e| e.owner, Address::ZERO)
    }

    fn set_resolver(&self, node: &NodeId, resolver: Address) -> Result<(), RegistryError> {
        self.write(node, |entry| entry.resolver = resolver)
    }

    fn resolver(&self, node: &NodeId) -> Result<Address, RegistryError> {
        self.read(node, |e| e.resolver, Address::ZERO)
    }

    fn set_ttl(&self, node: &NodeId, ttl: Timestamp) -> Result<(), RegistryError> {
        self.write(node, |entry| entry.ttl = ttl)
    }

    fn ttl(&self, node: &NodeId) -> Result<Timestamp, RegistryError> {
        self.read(node, |e| e.ttl, 0)
    }

    fn set_addr(&self, node: &NodeId, addr: Address) -> Result<(), RegistryError> {
        self.write(node, |entry| entry.addr = addr)
    }

    fn addr(&self, node: &NodeId) -> Result<Address, RegistryError> {
        self.read(node, |e| e.addr, Address::ZERO)
    }
}
