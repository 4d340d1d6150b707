use std::sync::{Arc, RwLock};

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, Balance, Timestamp};
use nomen_crypto::label_id;
use nomen_pricing::PricePolicy;
use nomen_registry::OwnershipRegistry;
use nomen_token::{PaymentLedger, TokenReceiver};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::years_to_seconds;

/// Push-path payload for renewals, bincode-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenewCall {
    pub name: String,
    /// Renewal duration in years.
    pub duration: u128,
}

/// Renewal front-end. No commitment step: renewing is not contested, so
/// anyone may pay to extend any live name. Extension is anchored at the
/// current expiration, never at the payment time, and lapsed names cannot
/// be renewed back to life.
pub struct Renewer {
    registry: Arc<OwnershipRegistry>,
    ledger: Arc<dyn PaymentLedger>,
    pricing: RwLock<Arc<dyn PricePolicy>>,
    address: Address,
    pool: Address,
    admin: Address,
}

impl Renewer {
    pub fn new(
        registry: Arc<OwnershipRegistry>,
        ledger: Arc<dyn PaymentLedger>,
        pricing: Arc<dyn PricePolicy>,
        address: Address,
        pool: Address,
        admin: Address,
    ) -> Self {
        Self {
            registry,
            ledger,
            pricing: RwLock::new(pricing),
            address,
            pool,
            admin,
        }
    }

    /// Current price of renewing `name` for `duration` years.
    pub fn price(&self, name: &str, duration: u128) -> Result<Balance, RegistryError> {
        let expiration = self.registry.expiration_time(&label_id(name))?;
        self.pricing()?.price(name, expiration, duration)
    }

    /// Extend a live registration, pulling the priced amount from `caller`
    /// via pre-authorized allowance. Returns the new expiration.
    pub fn renew(
        &self,
        caller: &Address,
        name: &str,
        duration: u128,
        now: Timestamp,
    ) -> Result<Timestamp, RegistryError> {
        let (price, duration_secs) = self.validate(name, duration, now)?;

        let allowed = self.ledger.allowance(caller, &self.address)?;
        if allowed < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: allowed });
        }
        let balance = self.ledger.balance_of(caller)?;
        if balance < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: balance });
        }

        self.ledger.transfer_from(self.address, *caller, self.pool, price)?;
        let expiration = self
            .registry
            .renew(&self.address, &label_id(name), duration_secs, now)?;

        info!(%name, %price, %expiration, "renewed via allowance");
        Ok(expiration)
    }

    pub fn set_price_policy(
        &self,
        caller: &Address,
        policy: Arc<dyn PricePolicy>,
    ) -> Result<(), RegistryError> {
        if *caller != self.admin {
            return Err(RegistryError::Unauthorized);
        }
        let mut slot = self
            .pricing
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        *slot = policy;
        info!("pricing reference changed");
        Ok(())
    }

    fn pricing(&self) -> Result<Arc<dyn PricePolicy>, RegistryError> {
        Ok(self
            .pricing
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?
            .clone())
    }

    /// All-checks-no-mutations half of a renewal.
    fn validate(
        &self,
        name: &str,
        duration: u128,
        now: Timestamp,
    ) -> Result<(Balance, Timestamp), RegistryError> {
        let id = label_id(name);
        let price = self
            .pricing()?
            .price(name, self.registry.expiration_time(&id)?, duration)?;
        let duration_secs = years_to_seconds(duration)?;

        if !self.registry.is_renewer(&self.address) {
            return Err(RegistryError::Unauthorized);
        }
        self.registry.check_renew(&id, duration_secs, now)?;

        Ok((price, duration_secs))
    }
}

impl TokenReceiver for Renewer {
    /// Push path: verify the credited `amount` covers the price, renew,
    /// forward the price to the pool and refund any change.
    fn on_token_transfer(
        &self,
        payer: Address,
        amount: Balance,
        data: &[u8],
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let call: RenewCall =
            bincode::deserialize(data).map_err(|e| RegistryError::Serialization(e.to_string()))?;

        let (price, duration_secs) = self.validate(&call.name, call.duration, now)?;
        if amount < price {
            return Err(RegistryError::InsufficientPayment { need: price, have: amount });
        }

        self.ledger.transfer(self.address, self.pool, price)?;
        if amount > price {
            self.ledger.transfer(self.address, payer, amount - price)?;
        }
        let expiration = self
            .registry
            .renew(&self.address, &label_id(&call.name), duration_secs, now)?;

        info!(name = %call.name, %price, %expiration, "renewed via push payment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_core::constants::{PRICE_UNIT, SECONDS_PER_YEAR};
    use nomen_core::types::NodeId;
    use nomen_directory::MemoryDirectory;
    use nomen_pricing::StandardPricing;
    use nomen_registry::RegistryDb;
    use nomen_token::TokenLedger;

    const NOW: Timestamp = 2_000_000;
    const ROOT: NodeId = NodeId([7; 32]);

    const ADMIN: Address = Address([0xAA; 20]);
    const REGISTRAR_ADDR: Address = Address([0x01; 20]);
    const RENEWER_ADDR: Address = Address([0x02; 20]);
    const POOL: Address = Address([0x0F; 20]);

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nomen_renewal_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    struct Harness {
        renewer: Renewer,
        registry: Arc<OwnershipRegistry>,
        ledger: Arc<TokenLedger>,
    }

    /// Registry with "ilanolkies" registered to addr(5) for one year at NOW.
    fn setup(name: &str) -> Harness {
        let directory = Arc::new(MemoryDirectory::new());
        let registry = Arc::new(OwnershipRegistry::new(
            Arc::new(RegistryDb::open(temp_dir(name)).unwrap()),
            directory,
            ROOT,
            ADMIN,
            NOW,
            0,
        ));
        registry.add_registrar(&ADMIN, REGISTRAR_ADDR).unwrap();
        registry.add_renewer(&ADMIN, RENEWER_ADDR).unwrap();
        registry
            .register(&REGISTRAR_ADDR, &label_id("ilanolkies"), addr(5), SECONDS_PER_YEAR, NOW)
            .unwrap();

        let ledger = Arc::new(TokenLedger::new());
        let renewer = Renewer::new(
            registry.clone(),
            ledger.clone(),
            Arc::new(StandardPricing),
            RENEWER_ADDR,
            POOL,
            ADMIN,
        );
        Harness { renewer, registry, ledger }
    }

    fn fund(h: &Harness, who: Address, amount: Balance) {
        h.ledger.mint(who, amount).unwrap();
        h.ledger.approve(who, RENEWER_ADDR, amount).unwrap();
    }

    #[test]
    fn renewal_extends_from_current_expiration() {
        let h = setup("extends");
        let payer = addr(5);
        fund(&h, payer, 10 * PRICE_UNIT);

        // Paid mid-term: the extension anchors at the old expiration, not
        // at the payment time.
        let expiration = h.renewer.renew(&payer, "ilanolkies", 1, NOW + 1000).unwrap();
        assert_eq!(expiration, NOW + 2 * SECONDS_PER_YEAR);
        assert_eq!(h.registry.expiration_time(&label_id("ilanolkies")).unwrap(), expiration);
        assert_eq!(h.ledger.balance_of(&POOL).unwrap(), 2 * PRICE_UNIT);
    }

    #[test]
    fn anyone_may_pay_for_a_renewal() {
        let h = setup("third_party");
        let stranger = addr(9);
        fund(&h, stranger, 10 * PRICE_UNIT);

        h.renewer.renew(&stranger, "ilanolkies", 1, NOW).unwrap();
        // Ownership unchanged; only the expiration moved.
        assert_eq!(h.registry.owner_of(&label_id("ilanolkies"), NOW).unwrap(), addr(5));
    }

    #[test]
    fn lapsed_name_cannot_be_renewed() {
        let h = setup("lapsed");
        let payer = addr(5);
        fund(&h, payer, 10 * PRICE_UNIT);

        let after = NOW + SECONDS_PER_YEAR;
        assert_eq!(
            h.renewer.renew(&payer, "ilanolkies", 1, after).unwrap_err(),
            RegistryError::NameExpired
        );
        assert_eq!(h.ledger.balance_of(&payer).unwrap(), 10 * PRICE_UNIT);
    }

    #[test]
    fn unregistered_name_cannot_be_renewed() {
        let h = setup("unregistered");
        let payer = addr(5);
        fund(&h, payer, 10 * PRICE_UNIT);
        assert_eq!(
            h.renewer.renew(&payer, "absent", 1, NOW).unwrap_err(),
            RegistryError::NameExpired
        );
    }

    #[test]
    fn zero_duration_fails_before_any_payment() {
        let h = setup("zero");
        let payer = addr(5);
        fund(&h, payer, 10 * PRICE_UNIT);
        assert_eq!(
            h.renewer.renew(&payer, "ilanolkies", 0, NOW).unwrap_err(),
            RegistryError::ZeroDuration
        );
        assert_eq!(h.ledger.balance_of(&payer).unwrap(), 10 * PRICE_UNIT);
    }

    #[test]
    fn missing_allowance_fails_without_side_effects() {
        let h = setup("no_allowance");
        let payer = addr(5);
        h.ledger.mint(payer, 10 * PRICE_UNIT).unwrap();
        assert_eq!(
            h.renewer.renew(&payer, "ilanolkies", 1, NOW).unwrap_err(),
            RegistryError::InsufficientPayment { need: 2 * PRICE_UNIT, have: 0 }
        );
        assert_eq!(
            h.registry.expiration_time(&label_id("ilanolkies")).unwrap(),
            NOW + SECONDS_PER_YEAR
        );
    }

    #[test]
    fn push_path_renews_and_refunds_change() {
        let h = setup("push");
        let payer = addr(9);
        h.ledger.mint(payer, 10 * PRICE_UNIT).unwrap();

        let data = bincode::serialize(&RenewCall { name: "ilanolkies".into(), duration: 2 }).unwrap();
        h.ledger
            .transfer_and_call(payer, RENEWER_ADDR, 5 * PRICE_UNIT, &data, &h.renewer, NOW)
            .unwrap();

        // Two years cost 4 units; one unit of change came back.
        assert_eq!(h.ledger.balance_of(&POOL).unwrap(), 4 * PRICE_UNIT);
        assert_eq!(h.ledger.balance_of(&payer).unwrap(), 6 * PRICE_UNIT);
        assert_eq!(h.ledger.balance_of(&RENEWER_ADDR).unwrap(), 0);
        assert_eq!(
            h.registry.expiration_time(&label_id("ilanolkies")).unwrap(),
            NOW + 3 * SECONDS_PER_YEAR
        );
    }

    #[test]
    fn push_path_underpayment_unwinds_fully() {
        let h = setup("push_under");
        let payer = addr(9);
        h.ledger.mint(payer, 10 * PRICE_UNIT).unwrap();

        let data = bincode::serialize(&RenewCall { name: "ilanolkies".into(), duration: 2 }).unwrap();
        let err = h
            .ledger
            .transfer_and_call(payer, RENEWER_ADDR, PRICE_UNIT, &data, &h.renewer, NOW)
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::InsufficientPayment { need: 4 * PRICE_UNIT, have: PRICE_UNIT }
        );
        assert_eq!(h.ledger.balance_of(&payer).unwrap(), 10 * PRICE_UNIT);
        assert_eq!(
            h.registry.expiration_time(&label_id("ilanolkies")).unwrap(),
            NOW + SECONDS_PER_YEAR
        );
    }

    #[test]
    fn front_end_without_renewer_role_is_refused() {
        let h = setup("role");
        let payer = addr(5);
        fund(&h, payer, 10 * PRICE_UNIT);
        h.registry.remove_renewer(&ADMIN, RENEWER_ADDR).unwrap();

        assert_eq!(
            h.renewer.renew(&payer, "ilanolkies", 1, NOW).unwrap_err(),
            RegistryError::Unauthorized
        );
        assert_eq!(h.ledger.balance_of(&payer).unwrap(), 10 * PRICE_UNIT);
    }
}
