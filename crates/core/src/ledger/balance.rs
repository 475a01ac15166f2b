//! Layer balances.
//!
//! The core never stores balances. Rules read them through [`BalanceLookup`],
//! which the embedding application implements over its ledger storage.
//! [`InMemoryBalances`] is a reference implementation for tests and
//! single-process embedding.

use std::collections::HashMap;

use rust_decimal::Decimal;
use strata_shared::types::{AccountId, JournalId};
use thiserror::Error;

use super::account::{Account, AccountSide};
use super::layer::Layer;
use super::transaction::GlTransaction;

/// Failure to read a balance. An account with no history is not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceLookupError {
    /// The backing store could not be reached.
    #[error("balance store unavailable: {0}")]
    Unavailable(String),
    /// The store answered with an error.
    #[error("balance query failed: {0}")]
    Failed(String),
}

/// Read model over posted entries.
#[cfg_attr(test, mockall::automock)]
pub trait BalanceLookup {
    /// Net balance of `account` across `layers` in `journal`, in the
    /// account's own sign convention. Zero when the account has no history
    /// on those layers.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance cannot be read.
    fn balance(
        &self,
        journal: JournalId,
        account: &Account,
        layers: &[Layer],
    ) -> Result<Decimal, BalanceLookupError>;
}

/// Debit and credit totals of one account on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBalance {
    /// Normal balance side of the account.
    pub side: AccountSide,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl LayerBalance {
    /// Empty balance for an account on `side`.
    #[must_use]
    pub const fn new(side: AccountSide) -> Self {
        Self {
            side,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
        }
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Decimal) {
        self.debit_total += amount;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Decimal) {
        self.credit_total += amount;
    }

    /// Net balance on the account's normal side.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.side.balance_change(self.debit_total, self.credit_total)
    }
}

/// In-memory balances keyed by `(journal, account, layer)`.
///
/// Not synchronized: callers that share it must serialize postings per
/// account and layer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBalances {
    balances: HashMap<(JournalId, AccountId, Layer), LayerBalance>,
}

impl InMemoryBalances {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every entry of a posted transaction.
    pub fn apply(&mut self, transaction: &GlTransaction) {
        for entry in transaction.entries() {
            let balance = self
                .balances
                .entry((transaction.journal, entry.account.id, entry.layer))
                .or_insert_with(|| LayerBalance::new(entry.account.side));
            if entry.is_debit() {
                balance.add_debit(entry.amount);
            } else {
                balance.add_credit(entry.amount);
            }
        }
    }

    /// Seeds a balance directly, replacing any history on that layer.
    pub fn set(&mut self, journal: JournalId, account: &Account, layer: Layer, amount: Decimal) {
        let mut balance = LayerBalance::new(account.side);
        match account.side {
            AccountSide::Debit => balance.add_debit(amount),
            AccountSide::Credit => balance.add_credit(amount),
        }
        self.balances.insert((journal, account.id, layer), balance);
    }

    /// Balance of one account on one layer.
    #[must_use]
    pub fn get(&self, journal: JournalId, account: &Account, layer: Layer) -> Decimal {
        self.balances
            .get(&(journal, account.id, layer))
            .map_or(Decimal::ZERO, LayerBalance::balance)
    }
}

impl BalanceLookup for InMemoryBalances {
    fn balance(
        &self,
        journal: JournalId,
        account: &Account,
        layers: &[Layer],
    ) -> Result<Decimal, BalanceLookupError> {
        Ok(layers
            .iter()
            .map(|layer| self.get(journal, account, *layer))
            .sum())
    }
}
