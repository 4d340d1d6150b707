//! nomen-registry
//!
//! The Ownership Registry: authoritative name → (owner, expiration) store
//! shared by every registrar strategy. Strategy front-ends (commit-reveal
//! registrar, renewal service, auction-migration bridge) hold a reference
//! to one [`OwnershipRegistry`] and call through; the registry itself holds
//! no strategy logic, only capability checks.

pub mod db;
pub mod registry;

pub use db::RegistryDb;
pub use registry::OwnershipRegistry;
