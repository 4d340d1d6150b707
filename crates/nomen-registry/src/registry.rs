use std::sync::Arc;

use nomen_core::error::RegistryError;
use nomen_core::event::Event;
use nomen_core::record::NameRecord;
use nomen_core::types::{Address, LabelId, NodeId, Timestamp};
use nomen_directory::NameDirectory;
use tracing::{info, warn};

use crate::db::RegistryDb;

/// The ownership engine for one root node.
///
/// All mutating operations execute against the serialized ledger: they take
/// an explicit caller identity and ledger time, validate every precondition
/// before the first write, and either apply all effects (records + counts +
/// directory + event log) or return an error having written nothing.
///
/// Expiration is a derived predicate (`now >= expiration`), checked on every
/// read; storage cleanup by [`OwnershipRegistry::remove_expired`] is
/// advisory and lazy.
pub struct OwnershipRegistry {
    pub db: Arc<RegistryDb>,
    directory: Arc<dyn NameDirectory>,
    root: NodeId,
    admin: Address,
    /// Standard-path registrations are refused before this instant; the
    /// window is reserved for migrating names out of the legacy auction.
    registration_opens_at: Timestamp,
}

impl OwnershipRegistry {
    pub fn new(
        db: Arc<RegistryDb>,
        directory: Arc<dyn NameDirectory>,
        root: NodeId,
        admin: Address,
        deploy_time: Timestamp,
        migration_period: Timestamp,
    ) -> Self {
        Self {
            db,
            directory,
            root,
            admin,
            registration_opens_at: deploy_time + migration_period,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Current owner. Distinguishes never-registered (`NonexistentToken`)
    /// from registered-but-lapsed (`Expired`); never returns a stale owner.
    pub fn owner_of(&self, id: &LabelId, now: Timestamp) -> Result<Address, RegistryError> {
        match self.db.get_record(id)? {
            None => Err(RegistryError::NonexistentToken),
            Some(rec) if rec.owner.is_zero() => Err(RegistryError::NonexistentToken),
            Some(rec) if now >= rec.expiration => Err(RegistryError::Expired),
            Some(rec) => Ok(rec.owner),
        }
    }

    /// True iff never registered or expired. Never fails on content.
    pub fn available(&self, id: &LabelId, now: Timestamp) -> Result<bool, RegistryError> {
        Ok(match self.db.get_record(id)? {
            None => true,
            Some(rec) => rec.is_available(now),
        })
    }

    /// Raw stored expiration; `0` if never registered or fully cleared.
    /// May be stale — callers needing liveness must cross-check `available`.
    pub fn expiration_time(&self, id: &LabelId) -> Result<Timestamp, RegistryError> {
        Ok(self.db.get_record(id)?.map(|r| r.expiration).unwrap_or(0))
    }

    /// Number of live records currently attributed to `owner`. Lazy like the
    /// rest of storage: sweeping expired names is what decrements it.
    pub fn balance_of(&self, owner: &Address) -> Result<u64, RegistryError> {
        self.db.count_of(owner)
    }

    pub fn approved(&self, id: &LabelId) -> Result<Option<Address>, RegistryError> {
        self.db.approved(id)
    }

    /// All observable events in application order.
    pub fn events(&self) -> Result<Vec<Event>, RegistryError> {
        self.db.events()
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Validate a registration without side effects and return the
    /// expiration it would produce. Front-ends call this before collecting
    /// payment so that `register` cannot fail after funds have moved.
    pub fn check_register(
        &self,
        id: &LabelId,
        duration_secs: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        if now < self.registration_opens_at {
            return Err(RegistryError::RegistrationNotOpen {
                opens_at: self.registration_opens_at,
            });
        }
        if !self.available(id, now)? {
            return Err(RegistryError::Unavailable);
        }
        now.checked_add(duration_secs)
            .ok_or(RegistryError::AdditionOverflow)
    }

    /// Mint or re-mint ownership of `id` for `duration_secs`. Caller must
    /// hold the registrar capability.
    ///
    /// Re-registering an expired name is a vacate-then-mint compound: the
    /// prior owner is observably revoked (transfer to zero) before the new
    /// owner is installed.
    pub fn register(
        &self,
        caller: &Address,
        id: &LabelId,
        owner: Address,
        duration_secs: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        if !self.db.is_registrar(caller) {
            return Err(RegistryError::Unauthorized);
        }
        // The zero address is the vacancy sentinel; a zero-owner record
        // would be invisible to sweeps and queries.
        if owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        let expiration = self.check_register(id, duration_secs, now)?;

        self.vacate_if_lapsed(id)?;
        self.mint(id, owner, expiration)?;
        self.directory.set_subnode_owner(&self.root, id, owner)?;

        info!(label = %id, owner = %owner, %expiration, "registered name");
        Ok(expiration)
    }

    /// Validate a renewal without side effects; returns the extended
    /// expiration.
    pub fn check_renew(
        &self,
        id: &LabelId,
        duration_secs: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        let rec = match self.db.get_record(id)? {
            Some(rec) if !rec.is_available(now) => rec,
            // Renewal never resurrects; only register can.
            _ => return Err(RegistryError::NameExpired),
        };
        rec.expiration
            .checked_add(duration_secs)
            .ok_or(RegistryError::AdditionOverflow)
    }

    /// Extend a live registration. Caller must hold the renewer capability.
    pub fn renew(
        &self,
        caller: &Address,
        id: &LabelId,
        duration_secs: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        if !self.db.is_renewer(caller) {
            return Err(RegistryError::Unauthorized);
        }
        let expiration = self.check_renew(id, duration_secs, now)?;

        let mut rec = self.db.get_record(id)?.ok_or(RegistryError::NameExpired)?;
        rec.expiration = expiration;
        self.db.put_record(&rec)?;
        self.db.append_event(&Event::ExpirationChanged { label_id: *id, expiration })?;

        info!(label = %id, %expiration, "renewed name");
        Ok(expiration)
    }

    /// Adopt a name won through the legacy auction: mints ownership with the
    /// expiration the legacy escrow paid for, without touching the
    /// directory's existing owner/resolver for the name. Registrar-gated and
    /// exempt from the migration gate.
    pub fn adopt(
        &self,
        caller: &Address,
        id: &LabelId,
        owner: Address,
        expiration: Timestamp,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if !self.db.is_registrar(caller) {
            return Err(RegistryError::Unauthorized);
        }
        if owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if !self.available(id, now)? {
            return Err(RegistryError::Unavailable);
        }

        self.vacate_if_lapsed(id)?;
        self.mint(id, owner, expiration)?;

        info!(label = %id, owner = %owner, %expiration, "adopted legacy name");
        Ok(())
    }

    // ── Sweeping ─────────────────────────────────────────────────────────────

    /// Best-effort batch sweep of expired records. Ids that do not exist or
    /// are not yet expired are silently skipped; only genuinely lapsed
    /// records are cleared (owner/expiration reset, owner count
    /// decremented, directory subnode zeroed). Idempotent and
    /// order-independent.
    pub fn remove_expired(&self, ids: &[LabelId], now: Timestamp) -> Result<(), RegistryError> {
        for id in ids {
            let rec = match self.db.get_record(id)? {
                Some(rec) => rec,
                None => continue,
            };
            if rec.owner.is_zero() || !rec.is_available(now) {
                continue;
            }

            self.db.remove_record(id)?;
            self.db.clear_approval(id)?;
            self.db.decrement_count(&rec.owner)?;
            self.directory.set_subnode_owner(&self.root, id, Address::ZERO)?;
            self.db.append_event(&Event::OwnershipTransferred {
                from: rec.owner,
                to: Address::ZERO,
                label_id: *id,
            })?;
            info!(label = %id, prior_owner = %rec.owner, "swept expired name");
        }
        Ok(())
    }

    // ── Custody ──────────────────────────────────────────────────────────────

    /// Re-point the directory's resolution owner for a live name, without
    /// touching registry custody. Lets a registrant delegate day-to-day
    /// directory management while keeping renewal control.
    pub fn reclaim(
        &self,
        caller: &Address,
        id: &LabelId,
        new_directory_owner: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let rec = match self.db.get_record(id)? {
            Some(rec) if !rec.is_available(now) => rec,
            _ => return Err(RegistryError::NameExpired),
        };
        if !self.is_owner_or_delegate(&rec, id, caller)? {
            return Err(RegistryError::Unauthorized);
        }
        self.directory.set_subnode_owner(&self.root, id, new_directory_owner)?;
        info!(label = %id, directory_owner = %new_directory_owner, "reclaimed subnode");
        Ok(())
    }

    /// Transfer registry custody of a live name. Directory state is left
    /// untouched; the new owner reclaims when ready.
    pub fn transfer(
        &self,
        caller: &Address,
        id: &LabelId,
        to: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if to.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        let from = self.owner_of(id, now)?;
        let rec = self.db.get_record(id)?.ok_or(RegistryError::NonexistentToken)?;
        if !self.is_owner_or_delegate(&rec, id, caller)? {
            return Err(RegistryError::Unauthorized);
        }

        let mut rec = rec;
        rec.owner = to;
        self.db.put_record(&rec)?;
        self.db.clear_approval(id)?;
        self.db.decrement_count(&from)?;
        self.db.increment_count(&to)?;
        self.db.append_event(&Event::OwnershipTransferred { from, to, label_id: *id })?;
        info!(label = %id, %from, %to, "transferred name");
        Ok(())
    }

    /// Approve a per-name delegate who may `reclaim` and `transfer`, or
    /// revoke one by approving the zero address. Owner-only; cleared
    /// automatically on transfer and sweep.
    pub fn approve(
        &self,
        caller: &Address,
        id: &LabelId,
        delegate: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let owner = self.owner_of(id, now)?;
        if owner != *caller {
            return Err(RegistryError::Unauthorized);
        }
        if delegate.is_zero() {
            self.db.clear_approval(id)
        } else {
            self.db.set_approval(id, delegate)
        }
    }

    // ── Role management ──────────────────────────────────────────────────────

    pub fn is_registrar(&self, who: &Address) -> bool {
        self.db.is_registrar(who)
    }

    pub fn add_registrar(&self, caller: &Address, who: Address) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.db.add_registrar(&who)?;
        info!(registrar = %who, "granted registrar role");
        Ok(())
    }

    pub fn remove_registrar(&self, caller: &Address, who: Address) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.db.remove_registrar(&who)?;
        warn!(registrar = %who, "revoked registrar role");
        Ok(())
    }

    pub fn is_renewer(&self, who: &Address) -> bool {
        self.db.is_renewer(who)
    }

    pub fn add_renewer(&self, caller: &Address, who: Address) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.db.add_renewer(&who)?;
        info!(renewer = %who, "granted renewer role");
        Ok(())
    }

    pub fn remove_renewer(&self, caller: &Address, who: Address) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.db.remove_renewer(&who)?;
        warn!(renewer = %who, "revoked renewer role");
        Ok(())
    }

    // ── Root-node administration ─────────────────────────────────────────────

    pub fn set_root_resolver(
        &self,
        caller: &Address,
        resolver: Address,
    ) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.directory.set_resolver(&self.root, resolver)
    }

    pub fn set_root_ttl(&self, caller: &Address, ttl: Timestamp) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.directory.set_ttl(&self.root, ttl)
    }

    /// Hand the root node itself to a successor registry.
    pub fn set_directory_owner(
        &self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.directory.set_node_owner(&self.root, new_owner)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn ensure_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.admin {
            return Err(RegistryError::Unauthorized);
        }
        Ok(())
    }

    fn is_owner_or_delegate(
        &self,
        rec: &NameRecord,
        id: &LabelId,
        caller: &Address,
    ) -> Result<bool, RegistryError> {
        if rec.owner == *caller {
            return Ok(true);
        }
        Ok(self.db.approved(id)? == Some(*caller))
    }

    /// If a lapsed record still occupies storage, revoke it observably
    /// before the new owner is installed.
    fn vacate_if_lapsed(&self, id: &LabelId) -> Result<(), RegistryError> {
        if let Some(prior) = self.db.get_record(id)? {
            if !prior.owner.is_zero() {
                self.db.decrement_count(&prior.owner)?;
                self.db.clear_approval(id)?;
                self.db.append_event(&Event::OwnershipTransferred {
                    from: prior.owner,
                    to: Address::ZERO,
                    label_id: *id,
                })?;
            }
        }
        Ok(())
    }

    fn mint(&self, id: &LabelId, owner: Address, expiration: Timestamp) -> Result<(), RegistryError> {
        self.db.put_record(&NameRecord::new(*id, owner, expiration))?;
        self.db.increment_count(&owner)?;
        self.db.append_event(&Event::OwnershipTransferred {
            from: Address::ZERO,
            to: owner,
            label_id: *id,
        })?;
        self.db.append_event(&Event::ExpirationChanged { label_id: *id, expiration })?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
