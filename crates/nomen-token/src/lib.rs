//! nomen-token
//!
//! Interface to the external payment medium. The registration core only
//! needs "debit payer, credit pool, fail atomically on insufficient funds",
//! plus the single-call push path in which a transfer carries an encoded
//! call payload and triggers the recipient's callback in the same
//! transaction.
//!
//! [`TokenLedger`] is the in-process fungible-token implementation used for
//! wiring and tests.

pub mod ledger;

pub use ledger::TokenLedger;

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, Balance, Timestamp};

/// Balance/allowance surface of the payment token.
///
/// Every transfer either fully moves funds or fails with
/// `InsufficientPayment` and moves nothing.
pub trait PaymentLedger: Send + Sync {
    fn balance_of(&self, who: &Address) -> Result<Balance, RegistryError>;

    fn allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, RegistryError>;

    /// Authorize `spender` to pull up to `amount` from `owner`.
    fn approve(&self, owner: Address, spender: Address, amount: Balance)
        -> Result<(), RegistryError>;

    fn transfer(&self, from: Address, to: Address, amount: Balance) -> Result<(), RegistryError>;

    /// Pull path: `spender` moves `amount` of `from`'s funds to `to`,
    /// consuming allowance.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Balance,
    ) -> Result<(), RegistryError>;

    /// Push path: move `amount` from `from` to `to`, then invoke
    /// `receiver.on_token_transfer` with the opaque `data` payload. If the
    /// callback fails the transfer is unwound and the error propagates, so
    /// the whole call is all-or-nothing.
    fn transfer_and_call(
        &self,
        from: Address,
        to: Address,
        amount: Balance,
        data: &[u8],
        receiver: &dyn TokenReceiver,
        now: Timestamp,
    ) -> Result<(), RegistryError>;
}

/// Implemented by components that accept push-path payments.
///
/// By the time this runs, `amount` has already been credited to the
/// receiver's ledger account; the receiver forwards the priced portion to
/// its pool and refunds any change to `payer`.
pub trait TokenReceiver: Send + Sync {
    fn on_token_transfer(
        &self,
        payer: Address,
        amount: Balance,
        data: &[u8],
        now: Timestamp,
    ) -> Result<(), RegistryError>;
}
