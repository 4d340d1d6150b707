use std::collections::HashMap;
use std::sync::RwLock;

use nomen_core::error::RegistryError;
use nomen_core::types::{Address, Balance, Timestamp};
use tracing::warn;

use crate::{PaymentLedger, TokenReceiver};

#[derive(Default)]
struct Books {
    balances: HashMap<Address, Balance>,
    allowances: HashMap<(Address, Address), Balance>,
}

impl Books {
    fn debit(&mut self, who: &Address, amount: Balance) -> Result<(), RegistryError> {
        let have = self.balances.get(who).copied().unwrap_or(0);
        if have < amount {
            return Err(RegistryError::InsufficientPayment { need: amount, have });
        }
        self.balances.insert(*who, have - amount);
        Ok(())
    }

    fn credit(&mut self, who: &Address, amount: Balance) {
        let entry = self.balances.entry(*who).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

/// In-memory fungible-token ledger for wiring and tests.
pub struct TokenLedger {
    books: RwLock<Books>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self { books: RwLock::new(Books::default()) }
    }

    /// Seed a balance. Test/deployment helper, not part of the payment
    /// surface the core depends on.
    pub fn mint(&self, to: Address, amount: Balance) -> Result<(), RegistryError> {
        let mut books = self.lock_mut()?;
        books.credit(&to, amount);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::RwLockReadGuard<'_, Books>, RegistryError> {
        self.books.read().map_err(|e| RegistryError::Storage(e.to_string()))
    }

    fn lock_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, Books>, RegistryError> {
        self.books.write().map_err(|e| RegistryError::Storage(e.to_string()))
    }
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentLedger for TokenLedger {
    fn balance_of(&self, who: &Address) -> Result<Balance, RegistryError> {
        Ok(self.lock()?.balances.get(who).copied().unwrap_or(0))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, RegistryError> {
        Ok(self
            .lock()?
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0))
    }

    fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: Balance,
    ) -> Result<(), RegistryError> {
        self.lock_mut()?.allowances.insert((owner, spender), amount);
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: Balance) -> Result<(), RegistryError> {
        let mut books = self.lock_mut()?;
        books.debit(&from, amount)?;
        books.credit(&to, amount);
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Balance,
    ) -> Result<(), RegistryError> {
        let mut books = self.lock_mut()?;
        let allowed = books.allowances.get(&(from, spender)).copied().unwrap_or(0);
        if allowed < amount {
            return Err(RegistryError::InsufficientPayment { need: amount, have: allowed });
        }
        books.debit(&from, amount)?;
        books.credit(&to, amount);
        books.allowances.insert((from, spender), allowed - amount);
        Ok(())
    }

    fn transfer_and_call(
        &self,
        from: Address,
        to: Address,
        amount: Balance,
        data: &[u8],
        receiver: &dyn TokenReceiver,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        self.transfer(from, to, amount)?;
        // The guard must not be held across the callback: the receiver
        // issues its own transfers against this ledger.
        if let Err(e) = receiver.on_token_transfer(from, amount, data, now) {
            warn!(payer = %from, %amount, error = %e, "push payment rejected, unwinding");
            self.transfer(to, from, amount)?;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn transfer_moves_funds() {
        let ledger = TokenLedger::new();
        ledger.mint(addr(1), 100).unwrap();
        ledger.transfer(addr(1), addr(2), 40).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), 60);
        assert_eq!(ledger.balance_of(&addr(2)).unwrap(), 40);
    }

    #[test]
    fn transfer_insufficient_funds() {
        let ledger = TokenLedger::new();
        ledger.mint(addr(1), 10).unwrap();
        let err = ledger.transfer(addr(1), addr(2), 40).unwrap_err();
        assert_eq!(err, RegistryError::InsufficientPayment { need: 40, have: 10 });
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), 10);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let ledger = TokenLedger::new();
        ledger.mint(addr(1), 100).unwrap();
        ledger.approve(addr(1), addr(9), 50).unwrap();
        ledger.transfer_from(addr(9), addr(1), addr(2), 30).unwrap();
        assert_eq!(ledger.allowance(&addr(1), &addr(9)).unwrap(), 20);
        assert_eq!(ledger.balance_of(&addr(2)).unwrap(), 30);
    }

    #[test]
    fn transfer_from_without_allowance_fails() {
        let ledger = TokenLedger::new();
        ledger.mint(addr(1), 100).unwrap();
        let err = ledger.transfer_from(addr(9), addr(1), addr(2), 30).unwrap_err();
        assert_eq!(err, RegistryError::InsufficientPayment { need: 30, have: 0 });
    }

    struct Rejector;

    impl TokenReceiver for Rejector {
        fn on_token_transfer(
            &self,
            _payer: Address,
            _amount: Balance,
            _data: &[u8],
            _now: Timestamp,
        ) -> Result<(), RegistryError> {
            Err(RegistryError::NoCommitmentFound)
        }
    }

    #[test]
    fn failed_callback_unwinds_push_transfer() {
        let ledger = TokenLedger::new();
        ledger.mint(addr(1), 100).unwrap();
        let err = ledger
            .transfer_and_call(addr(1), addr(2), 60, &[], &Rejector, 0)
            .unwrap_err();
        assert_eq!(err, RegistryError::NoCommitmentFound);
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), 100);
        assert_eq!(ledger.balance_of(&addr(2)).unwrap(), 0);
    }
}
