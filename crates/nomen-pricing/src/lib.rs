//! nomen-pricing
//!
//! Duration-tiered registration pricing. Pure, stateless, overflow-checked.

use nomen_core::constants::PRICE_UNIT;
use nomen_core::error::RegistryError;
use nomen_core::types::{Balance, Timestamp};

/// Replaceable pricing reference held by the front-ends.
///
/// `name` and `expiration` are accepted for forward extensibility
/// (length- or renewal-aware pricing); the standard policy ignores them.
pub trait PricePolicy: Send + Sync {
    /// Price of registering/renewing for `duration` years, in base token
    /// units. Total over `duration > 0`.
    fn price(
        &self,
        name: &str,
        expiration: Timestamp,
        duration: u128,
    ) -> Result<Balance, RegistryError>;
}

/// The standard tariff:
///
///   1 year        → 2 × PRICE_UNIT
///   n ≥ 2 years   → (n + 2) × PRICE_UNIT
///
/// The one-year price sits on the n ≥ 2 curve extended down by one step;
/// it is kept exactly as observed in production rather than "fixed".
pub struct StandardPricing;

impl PricePolicy for StandardPricing {
    fn price(
        &self,
        _name: &str,
        _expiration: Timestamp,
        duration: u128,
    ) -> Result<Balance, RegistryError> {
        match duration {
            0 => Err(RegistryError::ZeroDuration),
            1 => 2u128
                .checked_mul(PRICE_UNIT)
                .ok_or(RegistryError::MultiplicationOverflow),
            _ => duration
                .checked_add(2)
                .ok_or(RegistryError::AdditionOverflow)?
                .checked_mul(PRICE_UNIT)
                .ok_or(RegistryError::MultiplicationOverflow),
        }
    }
}
