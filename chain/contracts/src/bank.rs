//! Bank: native currency balances and the atomic transfer primitive
//!
//! The ledger never moves money itself; it describes every movement of an
//! operation as a batch of transfer legs and hands the batch to `settle`,
//! which applies all of them or none.

use rust_decimal::Decimal;
use std::collections::HashMap;
use voucher_types::amount;
use voucher_types::ids::Address;

use crate::errors::BankError;

/// One leg of a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
}

impl Transfer {
    pub fn new(from: impl Into<Address>, to: impl Into<Address>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

/// Balance book for the native currency.
///
/// `total_supply` only changes through `mint`; transfers conserve it.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    balances: HashMap<Address, Decimal>,
    total_supply: Decimal,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit new currency to an identity (genesis funding).
    pub fn mint(&mut self, to: impl Into<Address>, amount: Decimal) -> Result<(), BankError> {
        amount::validate(amount)?;
        let to = to.into();

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;
        let current = self.balance_of(to.as_str());
        let new_balance = current.checked_add(amount).ok_or(BankError::Overflow)?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Balance of an identity; unknown identities hold zero.
    pub fn balance_of(&self, account: &str) -> Decimal {
        self.balances.get(account).copied().unwrap_or(Decimal::ZERO)
    }

    /// Total currency in existence.
    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    /// Sum of all balances. Equals `total_supply` at all times.
    pub fn sum_of_balances(&self) -> Decimal {
        self.balances.values().copied().sum()
    }

    /// All known accounts.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Decimal)> {
        self.balances.iter()
    }

    /// Single-leg settlement.
    pub fn transfer(&mut self, from: &str, to: &str, amount: Decimal) -> Result<(), BankError> {
        self.settle(&[Transfer::new(from, to, amount)])
    }

    /// Apply a batch of transfers atomically.
    ///
    /// Legs are applied in order against a staged view, so a later leg may
    /// spend what an earlier leg credited. If any leg fails, no balance changes.
    pub fn settle(&mut self, transfers: &[Transfer]) -> Result<(), BankError> {
        let mut staged: HashMap<&Address, Decimal> = HashMap::new();

        for leg in transfers {
            amount::validate(leg.amount)?;
            if leg.amount.is_zero() {
                continue;
            }

            let available = staged
                .get(&leg.from)
                .copied()
                .unwrap_or_else(|| self.balance_of(leg.from.as_str()));
            if available < leg.amount {
                return Err(BankError::InsufficientBalance {
                    account: leg.from.to_string(),
                    required: leg.amount.to_string(),
                    available: available.to_string(),
                });
            }
            let debited = available
                .checked_sub(leg.amount)
                .ok_or(BankError::Overflow)?;
            staged.insert(&leg.from, debited);

            let current = staged
                .get(&leg.to)
                .copied()
                .unwrap_or_else(|| self.balance_of(leg.to.as_str()));
            let credited = current.checked_add(leg.amount).ok_or(BankError::Overflow)?;
            staged.insert(&leg.to, credited);
        }

        for (account, balance) in staged {
            self.balances.insert(account.clone(), balance);
        }
        Ok(())
    }
}
