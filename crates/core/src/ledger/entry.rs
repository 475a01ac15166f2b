//! Ledger entry domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{LedgerEntryId, TransactionId};

use super::account::{AccountRef, AccountSide};
use super::layer::Layer;
use super::tags::Tags;

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Debit entry (increases debit-side accounts, decreases credit-side ones).
    Debit,
    /// Credit entry (increases credit-side accounts, decreases debit-side ones).
    Credit,
}

impl EntryType {
    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// A single ledger entry in a transaction.
///
/// Entries are append-only: a transaction never mutates or removes one.
#[derive(Debug, Clone)]
pub struct GlEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// The transaction this entry belongs to.
    pub transaction_id: TransactionId,
    /// The account affected by this entry.
    pub account: AccountRef,
    /// Layer the entry posts to.
    pub layer: Layer,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Positive magnitude; direction is carried by `entry_type`.
    pub amount: Decimal,
    /// Line description.
    pub detail: String,
    /// Entry tags.
    pub tags: Tags,
}

impl GlEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    ///
    /// Per layer, the signed amounts of a balanced transaction sum to zero.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => -self.amount,
        }
    }

    /// Returns true for debit entries.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.entry_type == EntryType::Debit
    }

    /// Returns true for credit entries.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.entry_type == EntryType::Credit
    }

    /// Returns true if the entry increases its account's balance.
    #[must_use]
    pub fn is_increase(&self) -> bool {
        matches!(
            (self.entry_type, self.account.side),
            (EntryType::Debit, AccountSide::Debit) | (EntryType::Credit, AccountSide::Credit)
        )
    }

    /// Account-relative impact: `+amount` when the entry increases the
    /// account, `-amount` otherwise.
    #[must_use]
    pub fn impact(&self) -> Decimal {
        if self.is_increase() {
            self.amount
        } else {
            -self.amount
        }
    }
}
