use std::sync::Arc;

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, Balance, LabelId, Timestamp};
use nomen_registry::OwnershipRegistry;
use tracing::info;

/// A name's escrow state in the legacy auction system: who won it and how
/// much of their deposit is still locked. Releasing the locked amount is the
/// legacy system's job; this side only needs the holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyEscrow {
    pub holder: Address,
    pub locked_amount: Balance,
}

/// One-way migration bridge out of the legacy auction registrar.
///
/// The legacy system hands over names one at a time; each handover mints
/// registry ownership with the expiration the auction deposit already paid
/// for. Only the designated predecessor may trigger a handover, and the
/// directory's existing records for the name are deliberately left alone so
/// resolution is uninterrupted across the migration.
pub struct AuctionBridge {
    registry: Arc<OwnershipRegistry>,
    /// This bridge's registry identity; must hold the registrar capability.
    address: Address,
    previous_registrar: Address,
}

impl AuctionBridge {
    pub fn new(
        registry: Arc<OwnershipRegistry>,
        address: Address,
        previous_registrar: Address,
    ) -> Self {
        Self { registry, address, previous_registrar }
    }

    /// Accept a name handed over by the legacy registrar. `expiration` is
    /// the absolute instant the legacy deposit covers.
    pub fn accept_registrar_transfer(
        &self,
        caller: &Address,
        label_id: LabelId,
        escrow: LegacyEscrow,
        expiration: Timestamp,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if *caller != self.previous_registrar {
            return Err(RegistryError::OnlyPreviousRegistrar);
        }

        self.registry
            .adopt(&self.address, &label_id, escrow.holder, expiration, now)?;

        info!(label = %label_id, holder = %escrow.holder, %expiration, "migrated legacy name");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_core::constants::SECONDS_PER_YEAR;
    use nomen_core::types::NodeId;
    use nomen_crypto::{label_id, subnode};
    use nomen_directory::{MemoryDirectory, NameDirectory};
    use nomen_registry::RegistryDb;

    const NOW: Timestamp = 2_000_000;
    const ROOT: NodeId = NodeId([7; 32]);

    const ADMIN: Address = Address([0xAA; 20]);
    const BRIDGE_ADDR: Address = Address([0x03; 20]);
    const LEGACY: Address = Address([0x04; 20]);

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nomen_bridge_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// Registry still inside a 15-day migration window, bridged to LEGACY.
    fn setup(name: &str) -> (AuctionBridge, Arc<OwnershipRegistry>, Arc<MemoryDirectory>) {
        let directory = Arc::new(MemoryDirectory::new());
        let registry = Arc::new(OwnershipRegistry::new(
            Arc::new(RegistryDb::open(temp_dir(name)).unwrap()),
            directory.clone(),
            ROOT,
            ADMIN,
            NOW,
            15 * 24 * 60 * 60,
        ));
        registry.add_registrar(&ADMIN, BRIDGE_ADDR).unwrap();
        let bridge = AuctionBridge::new(registry.clone(), BRIDGE_ADDR, LEGACY);
        (bridge, registry, directory)
    }

    #[test]
    fn only_previous_registrar_may_hand_over() {
        let (bridge, ..) = setup("gating");
        let escrow = LegacyEscrow { holder: addr(5), locked_amount: 1_000 };
        for caller in [addr(5), ADMIN, BRIDGE_ADDR] {
            assert_eq!(
                bridge
                    .accept_registrar_transfer(&caller, label_id("auctioned"), escrow, NOW + 100, NOW)
                    .unwrap_err(),
                RegistryError::OnlyPreviousRegistrar
            );
        }
    }

    #[test]
    fn handover_mints_during_migration_window() {
        let (bridge, registry, _) = setup("window");
        let id = label_id("auctioned");
        let escrow = LegacyEscrow { holder: addr(5), locked_amount: 1_000 };

        // Standard registration is still gated at this point.
        assert!(matches!(
            registry.check_register(&id, SECONDS_PER_YEAR, NOW),
            Err(RegistryError::RegistrationNotOpen { .. })
        ));

        bridge
            .accept_registrar_transfer(&LEGACY, id, escrow, NOW + SECONDS_PER_YEAR, NOW)
            .unwrap();
        assert_eq!(registry.owner_of(&id, NOW).unwrap(), addr(5));
        assert_eq!(registry.expiration_time(&id).unwrap(), NOW + SECONDS_PER_YEAR);
    }

    #[test]
    fn handover_leaves_directory_untouched() {
        let (bridge, _, directory) = setup("directory");
        let id = label_id("auctioned");
        let node = subnode(&ROOT, &id);
        // Legacy resolution already points somewhere; migration must not
        // interrupt it.
        directory.set_node_owner(&node, addr(8)).unwrap();
        directory.set_resolver(&node, addr(9)).unwrap();

        bridge
            .accept_registrar_transfer(
                &LEGACY,
                id,
                LegacyEscrow { holder: addr(5), locked_amount: 0 },
                NOW + 100,
                NOW,
            )
            .unwrap();

        assert_eq!(directory.owner(&node).unwrap(), addr(8));
        assert_eq!(directory.resolver(&node).unwrap(), addr(9));
    }

    #[test]
    fn handover_of_a_live_name_is_refused() {
        let (bridge, registry, _) = setup("occupied");
        let id = label_id("auctioned");
        let escrow = LegacyEscrow { holder: addr(5), locked_amount: 0 };
        bridge
            .accept_registrar_transfer(&LEGACY, id, escrow, NOW + 1_000, NOW)
            .unwrap();

        let rival = LegacyEscrow { holder: addr(6), locked_amount: 0 };
        assert_eq!(
            bridge
                .accept_registrar_transfer(&LEGACY, id, rival, NOW + 2_000, NOW)
                .unwrap_err(),
            RegistryError::Unavailable
        );
        assert_eq!(registry.owner_of(&id, NOW).unwrap(), addr(5));
    }

    #[test]
    fn bridge_without_registrar_capability_is_refused() {
        let (bridge, registry, _) = setup("capability");
        registry.remove_registrar(&ADMIN, BRIDGE_ADDR).unwrap();
        assert_eq!(
            bridge
                .accept_registrar_transfer(
                    &LEGACY,
                    label_id("auctioned"),
                    LegacyEscrow { holder: addr(5), locked_amount: 0 },
                    NOW + 100,
                    NOW,
                )
                .unwrap_err(),
            RegistryError::Unauthorized
        );
    }
}
