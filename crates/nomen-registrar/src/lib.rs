//! nomen-registrar
//!
//! Front-ends over the shared Ownership Registry:
//!
//! - [`FifsRegistrar`] — first-in-first-served registration gated behind a
//!   commit-reveal exchange, with payment via the Pricing Engine.
//! - [`Renewer`] — extends live registrations; no commit-reveal since no
//!   new name is being claimed.
//! - [`AuctionBridge`] — one-directional adapter for names won through the
//!   legacy auction.
//!
//! Each front-end holds a reference to the same registry instance and calls
//! through if authorized; they share no behavior beyond that.

pub mod bridge;
pub mod commitments;
pub mod fifs;
pub mod renewal;

pub use bridge::{AuctionBridge, LegacyEscrow};
pub use commitments::CommitmentStore;
pub use fifs::{FifsRegistrar, RegisterCall};
pub use renewal::{RenewCall, Renewer};

use nomen_core::constants::SECONDS_PER_YEAR;
use nomen_core::error::RegistryError;
use nomen_core::types::Timestamp;

/// Convert a registration duration in years to ledger seconds,
/// overflow-checked. Durations the pricing curve accepts can still exceed
/// what a timestamp can hold; that is a multiplication overflow here.
pub fn years_to_seconds(years: u128) -> Result<Timestamp, RegistryError> {
    let years = Timestamp::try_from(years).map_err(|_| RegistryError::MultiplicationOverflow)?;
    years
        .checked_mul(SECONDS_PER_YEAR)
        .ok_or(RegistryError::MultiplicationOverflow)
}
