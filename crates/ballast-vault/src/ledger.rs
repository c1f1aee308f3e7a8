// crates/ballast-vault/src/ledger.rs
//
// Receipt-share ledger: fungible balances and allowances, keyed by era.
//
// Shares are ordinary fungible balances with ERC20-style allowance
// semantics. Keying by era makes a pool rollover cheap: a fresh era simply
// starts from empty maps, while the closed era's balances stay frozen in
// storage for auditability. Live operations only ever touch the current
// era.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use ballast_core::{AccountId, BallastError, Result, Shares};

use crate::pool::Era;

/// Sentinel allowance treated as infinite: `transfer_from` never
/// decrements it.
pub const ALLOWANCE_MAX: Shares = Shares::MAX;

/// Era-keyed share balances and allowances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptLedger {
    balances: BTreeMap<Era, HashMap<AccountId, Shares>>,
    allowances: BTreeMap<Era, HashMap<AccountId, HashMap<AccountId, Shares>>>,
}

impl ReceiptLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account` in `era`.
    pub fn balance_of(&self, era: Era, account: &AccountId) -> Shares {
        self.balances
            .get(&era)
            .and_then(|m| m.get(account))
            .copied()
            .unwrap_or(0)
    }

    /// Allowance granted by `owner` to `spender` in `era`.
    pub fn allowance(&self, era: Era, owner: &AccountId, spender: &AccountId) -> Shares {
        self.allowances
            .get(&era)
            .and_then(|m| m.get(owner))
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Create `amount` shares for `account`.
    ///
    /// # Errors
    /// Rejects the zero address; errors on balance overflow.
    pub fn mint(&mut self, era: Era, account: &AccountId, amount: Shares) -> Result<()> {
        if account.is_zero() {
            return Err(BallastError::InvalidArgument(
                "mint to the zero address".to_string(),
            ));
        }
        let balance = self
            .balances
            .entry(era)
            .or_default()
            .entry(*account)
            .or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BallastError::Arithmetic("share balance overflow".to_string()))?;
        Ok(())
    }

    /// Destroy `amount` shares held by `account`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the account holds fewer shares.
    pub fn burn(&mut self, era: Era, account: &AccountId, amount: Shares) -> Result<()> {
        let balance = self
            .balances
            .entry(era)
            .or_default()
            .entry(*account)
            .or_insert(0);
        if *balance < amount {
            return Err(BallastError::InsufficientBalance(format!(
                "burn of {} shares exceeds balance {}",
                amount, balance
            )));
        }
        *balance -= amount;
        Ok(())
    }

    /// Move `amount` shares from `from` to `to`.
    ///
    /// # Errors
    /// Rejects zero-address parties and transfers to the vault's own
    /// address; returns `InsufficientBalance` on a short balance.
    pub fn transfer(
        &mut self,
        era: Era,
        from: &AccountId,
        to: &AccountId,
        amount: Shares,
        vault_address: &AccountId,
    ) -> Result<()> {
        if from.is_zero() || to.is_zero() {
            return Err(BallastError::InvalidArgument(
                "transfer to or from the zero address".to_string(),
            ));
        }
        if to == vault_address {
            return Err(BallastError::InvalidArgument(
                "transfer to the vault itself".to_string(),
            ));
        }
        let balances = self.balances.entry(era).or_default();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(BallastError::InsufficientBalance(format!(
                "transfer of {} shares exceeds balance {}",
                amount, from_balance
            )));
        }
        // self-transfer is a no-op but not an error
        if from == to {
            return Ok(());
        }
        let to_balance = balances.get(to).copied().unwrap_or(0);
        let to_balance = to_balance
            .checked_add(amount)
            .ok_or_else(|| BallastError::Arithmetic("share balance overflow".to_string()))?;
        balances.insert(*from, from_balance - amount);
        balances.insert(*to, to_balance);
        Ok(())
    }

    /// Set the allowance from `owner` to `spender`.
    ///
    /// # Errors
    /// Rejects zero-address parties.
    pub fn approve(
        &mut self,
        era: Era,
        owner: &AccountId,
        spender: &AccountId,
        amount: Shares,
    ) -> Result<()> {
        if owner.is_zero() || spender.is_zero() {
            return Err(BallastError::InvalidArgument(
                "approval for the zero address".to_string(),
            ));
        }
        self.allowances
            .entry(era)
            .or_default()
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
        Ok(())
    }

    /// Raise the allowance by `added`, returning the new value.
    pub fn increase_allowance(
        &mut self,
        era: Era,
        owner: &AccountId,
        spender: &AccountId,
        added: Shares,
    ) -> Result<Shares> {
        let current = self.allowance(era, owner, spender);
        let next = current
            .checked_add(added)
            .ok_or_else(|| BallastError::Arithmetic("allowance overflow".to_string()))?;
        self.approve(era, owner, spender, next)?;
        Ok(next)
    }

    /// Lower the allowance by `subtracted`, returning the new value.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the decrease would go below zero.
    pub fn decrease_allowance(
        &mut self,
        era: Era,
        owner: &AccountId,
        spender: &AccountId,
        subtracted: Shares,
    ) -> Result<Shares> {
        let current = self.allowance(era, owner, spender);
        let next = current.checked_sub(subtracted).ok_or_else(|| {
            BallastError::InsufficientBalance("allowance decrease below zero".to_string())
        })?;
        self.approve(era, owner, spender, next)?;
        Ok(next)
    }

    /// Consume `amount` of the allowance from `owner` to `spender`.
    ///
    /// The `ALLOWANCE_MAX` sentinel is treated as infinite and is never
    /// decremented.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` on a short allowance.
    pub fn spend_allowance(
        &mut self,
        era: Era,
        owner: &AccountId,
        spender: &AccountId,
        amount: Shares,
    ) -> Result<()> {
        let current = self.allowance(era, owner, spender);
        if current == ALLOWANCE_MAX {
            return Ok(());
        }
        let next = current.checked_sub(amount).ok_or_else(|| {
            BallastError::InsufficientBalance(format!(
                "spend of {} shares exceeds allowance {}",
                amount, current
            ))
        })?;
        self.approve(era, owner, spender, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERA: Era = 1;

    fn acct(byte: u8) -> AccountId {
        AccountId([byte; 32])
    }

    fn vault_addr() -> AccountId {
        acct(0xfe)
    }

    #[test]
    fn test_mint_and_balance() {
        let mut ledger = ReceiptLedger::new();
        ledger.mint(ERA, &acct(1), 100).unwrap();
        ledger.mint(ERA, &acct(1), 50).unwrap();
        assert_eq!(ledger.balance_of(ERA, &acct(1)), 150);
        assert_eq!(ledger.balance_of(ERA + 1, &acct(1)), 0);
    }

    #[test]
    fn test_mint_to_zero_address_rejected() {
        let mut ledger = ReceiptLedger::new();
        assert!(ledger.mint(ERA, &AccountId::ZERO, 1).is_err());
    }

    #[test]
    fn test_burn_requires_balance() {
        let mut ledger = ReceiptLedger::new();
        ledger.mint(ERA, &acct(1), 100).unwrap();
        assert!(ledger.burn(ERA, &acct(1), 101).is_err());
        ledger.burn(ERA, &acct(1), 100).unwrap();
        assert_eq!(ledger.balance_of(ERA, &acct(1)), 0);
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = ReceiptLedger::new();
        ledger.mint(ERA, &acct(1), 100).unwrap();
        ledger
            .transfer(ERA, &acct(1), &acct(2), 60, &vault_addr())
            .unwrap();
        assert_eq!(ledger.balance_of(ERA, &acct(1)), 40);
        assert_eq!(ledger.balance_of(ERA, &acct(2)), 60);
    }

    #[test]
    fn test_transfer_rejects_zero_and_vault_addresses() {
        let mut ledger = ReceiptLedger::new();
        ledger.mint(ERA, &acct(1), 100).unwrap();
        assert!(ledger
            .transfer(ERA, &acct(1), &AccountId::ZERO, 10, &vault_addr())
            .is_err());
        assert!(ledger
            .transfer(ERA, &acct(1), &vault_addr(), 10, &vault_addr())
            .is_err());
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut ledger = ReceiptLedger::new();
        ledger.mint(ERA, &acct(1), 100).unwrap();
        ledger
            .transfer(ERA, &acct(1), &acct(1), 100, &vault_addr())
            .unwrap();
        assert_eq!(ledger.balance_of(ERA, &acct(1)), 100);
    }

    #[test]
    fn test_allowance_lifecycle() {
        let mut ledger = ReceiptLedger::new();
        ledger.approve(ERA, &acct(1), &acct(2), 100).unwrap();
        assert_eq!(ledger.allowance(ERA, &acct(1), &acct(2)), 100);

        let up = ledger.increase_allowance(ERA, &acct(1), &acct(2), 20).unwrap();
        assert_eq!(up, 120);

        let down = ledger.decrease_allowance(ERA, &acct(1), &acct(2), 50).unwrap();
        assert_eq!(down, 70);

        assert!(ledger.decrease_allowance(ERA, &acct(1), &acct(2), 71).is_err());
    }

    #[test]
    fn test_spend_allowance_decrements() {
        let mut ledger = ReceiptLedger::new();
        ledger.approve(ERA, &acct(1), &acct(2), 100).unwrap();
        ledger.spend_allowance(ERA, &acct(1), &acct(2), 30).unwrap();
        assert_eq!(ledger.allowance(ERA, &acct(1), &acct(2)), 70);
        assert!(ledger.spend_allowance(ERA, &acct(1), &acct(2), 71).is_err());
    }

    #[test]
    fn test_infinite_allowance_never_decrements() {
        let mut ledger = ReceiptLedger::new();
        ledger
            .approve(ERA, &acct(1), &acct(2), ALLOWANCE_MAX)
            .unwrap();
        ledger
            .spend_allowance(ERA, &acct(1), &acct(2), u128::MAX / 2)
            .unwrap();
        assert_eq!(ledger.allowance(ERA, &acct(1), &acct(2)), ALLOWANCE_MAX);
    }
}
