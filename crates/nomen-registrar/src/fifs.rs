use std::sync::{Arc, RwLock};

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, Balance, CommitmentId, LabelId, Secret, Timestamp};
use nomen_crypto::{label_id, make_commitment, subnode};
use nomen_directory::NameDirectory;
use nomen_pricing::PricePolicy;
use nomen_registry::OwnershipRegistry;
use nomen_token::{PaymentLedger, TokenReceiver};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commitments::CommitmentStore;
use crate::years_to_seconds;

/// Typed push-path payload carried by `transfer_and_call`, bincode-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterCall {
    pub name: String,
    pub owner: Address,
    pub secret: Secret,
    /// Registration duration in years.
    pub duration: u128,
    /// When set, the directory's resolved address for the new subnode is
    /// written as part of the same registration.
    pub addr: Option<Address>,
}

/// Commit-reveal registration front-end.
///
/// State machine per commitment hash:
/// `Unknown → Committed → (age elapsed) → Revealable → Consumed`. A fresh
/// commit to an unconsumed hash is rejected; consuming (successful
/// registration) deletes the commitment so the hash can cycle again.
///
/// Failed reveals are indistinguishable by design: never committed, too
/// young, wrong secret and wrong owner all surface as `NoCommitmentFound`,
/// so an observer learns nothing from failed attempts.
pub struct FifsRegistrar {
    store: CommitmentStore,
    registry: Arc<OwnershipRegistry>,
    directory: Arc<dyn NameDirectory>,
    ledger: Arc<dyn PaymentLedger>,
    pricing: RwLock<Arc<dyn PricePolicy>>,
    /// This front-end's own ledger identity; the registry sees it as the
    /// caller, and push-path funds pass through its account.
    address: Address,
    /// Destination of collected registration fees.
    pool: Address,
    admin: Address,
}

impl FifsRegistrar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: CommitmentStore,
        registry: Arc<OwnershipRegistry>,
        directory: Arc<dyn NameDirectory>,
        ledger: Arc<dyn PaymentLedger>,
        pricing: Arc<dyn PricePolicy>,
        address: Address,
        pool: Address,
        admin: Address,
    ) -> Self {
        Self {
            store,
            registry,
            directory,
            ledger,
            pricing: RwLock::new(pricing),
            address,
            pool,
            admin,
        }
    }

    /// Deterministic, collision-resistant binding of label, intended owner
    /// and secret. Pure.
    pub fn make_commitment(label: &LabelId, owner: &Address, secret: &Secret) -> CommitmentId {
        make_commitment(label, owner, secret)
    }

    /// Store a commitment hash at ledger time `now`.
    pub fn commit(&self, commitment: CommitmentId, now: Timestamp) -> Result<(), RegistryError> {
        self.store.insert_new(&commitment, now)?;
        info!(%commitment, "commitment stored");
        Ok(())
    }

    /// True iff the commitment is stored and old enough to reveal.
    pub fn can_reveal(&self, commitment: &CommitmentId, now: Timestamp) -> Result<bool, RegistryError> {
        Ok(match self.store.get(commitment)? {
            Some(committed_at) => now - committed_at >= self.store.min_commitment_age()?,
            None => false,
        })
    }

    /// Current price of registering `name` for `duration` years.
    pub fn price(&self, name: &str, duration: u128) -> Result<Balance, RegistryError> {
        self.pricing()?.price(name, 0, duration)
    }

    /// Reveal and register, pulling exactly the priced amount from `caller`
    /// via pre-authorized allowance.
    pub fn register(
        &self,
        caller: &Address,
        name: &str,
        owner: Address,
        secret: &Secret,
        duration: u128,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        self.register_inner(caller, name, owner, secret, duration, None, now)
    }

    /// `register` plus writing the directory's resolved address for the new
    /// subnode in the same transaction.
    pub fn register_with_addr(
        &self,
        caller: &Address,
        name: &str,
        owner: Address,
        secret: &Secret,
        duration: u128,
        addr: Address,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        self.register_inner(caller, name, owner, secret, duration, Some(addr), now)
    }

    // ── Administration ───────────────────────────────────────────────────────

    pub fn min_commitment_age(&self) -> Result<Timestamp, RegistryError> {
        self.store.min_commitment_age()
    }

    pub fn set_min_commitment_age(
        &self,
        caller: &Address,
        secs: Timestamp,
    ) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.store.set_min_commitment_age(secs)
    }

    pub fn min_length(&self) -> Result<usize, RegistryError> {
        self.store.min_length()
    }

    pub fn set_min_length(&self, caller: &Address, len: usize) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        self.store.set_min_length(len)
    }

    /// Swap the pricing reference. Observable through the log.
    pub fn set_price_policy(
        &self,
        caller: &Address,
        policy: Arc<dyn PricePolicy>,
    ) -> Result<(), RegistryError> {
        self.ensure_admin(caller)?;
        let mut slot = self
            .pricing
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        *slot = policy;
        info!("pricing reference changed");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn ensure_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.admin {
            return Err(RegistryError::Unauthorized);
        }
        Ok(())
    }

    fn pricing(&self) -> Result<Arc<dyn PricePolicy>, RegistryError> {
        Ok(self
            .pricing
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?
            .clone())
    }

    /// Validate everything a registration needs. Returns
    /// (label, commitment, price, duration in seconds) with no state touched,
    /// so callers can sequence payment collection knowing the registry call
    /// cannot fail afterwards.
    fn validate(
        &self,
        name: &str,
        owner: &Address,
        secret: &Secret,
        duration: u128,
        now: Timestamp,
    ) -> Result<(LabelId, CommitmentId, Balance, Timestamp), RegistryError> {
        let label = label_id(name);
        let commitment = make_commitment(&label, owner, secret);
        if !self.can_reveal(&commitment, now)? {
            return Err(RegistryError::NoCommitmentFound);
        }

        let min = self.store.min_length()?;
        if name.chars().count() < min {
            return Err(RegistryError::NameTooShort { min });
        }

        let price = self.pricing()?.price(name, 0, duration)?;
        let duration_secs = years_to_seconds(duration)?;

        if !self.registry.is_registrar(&self.address) {
            return Err(RegistryError::Unauthorized);
        }
        self.registry.check_register(&label, duration_secs, now)?;

        Ok((label, commitment, price, duration_secs))
    }

    fn register_inner(
        &self,
        caller: &Address,
        name: &str,
        owner: Address,
        secret: &Secret,
        duration: u128,
        addr: Option<Address>,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        let (label, commitment, price, duration_secs) =
            self.validate(name, &owner, secret, duration, now)?;

        // Funds pre-flight keeps the mutation sequence below infallible
        // under the serialized ledger.
        let allowed = self.ledger.allowance(caller, &self.address)?;
        if allowed < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: allowed });
        }
        let balance = self.ledger.balance_of(caller)?;
        if balance < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: balance });
        }

        self.store.remove(&commitment)?;
        self.ledger.transfer_from(self.address, *caller, self.pool, price)?;
        let expiration = self
            .registry
            .register(&self.address, &label, owner, duration_secs, now)?;
        if let Some(addr) = addr {
            self.directory.set_addr(&subnode(&self.registry.root(), &label), addr)?;
        }

        info!(%name, owner = %owner, %price, "registered via allowance");
        Ok(expiration)
    }
}

impl TokenReceiver for FifsRegistrar {
    /// Push path: the payer's transfer has already credited this front-end's
    /// account; decode the call, verify `amount` covers the price, register,
    /// forward the price to the pool and refund any change.
    fn on_token_transfer(
        &self,
        payer: Address,
        amount: Balance,
        data: &[u8],
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let call: RegisterCall =
            bincode::deserialize(data).map_err(|e| RegistryError::Serialization(e.to_string()))?;

        let (label, commitment, price, duration_secs) =
            self.validate(&call.name, &call.owner, &call.secret, call.duration, now)?;
        if amount < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: amount });
        }

        self.store.remove(&commitment)?;
        self.ledger.transfer(self.address, self.pool, price)?;
        if amount > price {
            self.ledger.transfer(self.address, payer, amount - price)?;
        }
        self.registry
            .register(&self.address, &label, call.owner, duration_secs, now)?;
        if let Some(addr) = call.addr {
            self.directory.set_addr(&subnode(&self.registry.root(), &label), addr)?;
        }

        info!(name = %call.name, owner = %call.owner, %price, "registered via push payment");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
