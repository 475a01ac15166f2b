//! Request and outcome types of the posting service.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use strata_shared::types::JournalId;

use super::strategy::{TransactionEntryRequest, TransactionGroup};
use super::transaction::GlTransaction;

/// Per-transaction bounds on `AMOUNT` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBounds {
    /// Smallest allowed amount.
    pub min: Decimal,
    /// Largest allowed amount.
    pub max: Decimal,
}

impl AmountBounds {
    /// Returns true if `amount` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Input for creating a ledger transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionRequest {
    /// Caller reference, used as the transaction detail.
    pub reference: String,
    /// Journal to post to. Falls back to the configured default.
    pub journal: Option<JournalId>,
    /// Whether funds stay pending until completion.
    pub pending: bool,
    /// Business group.
    pub group: TransactionGroup,
    /// Transaction type, e.g. `DEPOSIT`.
    pub transaction_type: String,
    /// Transaction-level metadata, stored as `key:value` tags.
    pub metadata: BTreeMap<String, String>,
    /// Entries to post.
    pub entries: Vec<TransactionEntryRequest>,
    /// Bounds on `AMOUNT` entries.
    pub limits: Option<AmountBounds>,
}

impl CreateTransactionRequest {
    /// Creates a request without entries.
    #[must_use]
    pub fn new(
        reference: impl Into<String>,
        group: TransactionGroup,
        transaction_type: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            journal: None,
            pending: false,
            group,
            transaction_type: transaction_type.into(),
            metadata: BTreeMap::new(),
            entries: Vec::new(),
            limits: None,
        }
    }

    /// Marks the transaction pending.
    #[must_use]
    pub const fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Sets the journal.
    #[must_use]
    pub const fn with_journal(mut self, journal: JournalId) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Adds transaction metadata.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: TransactionEntryRequest) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sets amount bounds.
    #[must_use]
    pub const fn with_limits(mut self, min: Decimal, max: Decimal) -> Self {
        self.limits = Some(AmountBounds { min, max });
        self
    }
}

/// Result of completing a pending transaction.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The transaction was completed earlier; nothing was posted.
    AlreadyCompleted,
    /// The completion transaction to persist.
    Completed(GlTransaction),
}

/// Result of reversing a transaction.
#[derive(Debug, Clone)]
pub enum ReversalOutcome {
    /// The transaction was reversed earlier; nothing was posted.
    AlreadyReversed,
    /// The reversal transaction to persist.
    Reversed(GlTransaction),
}

/// Result of reversing a transaction group.
#[derive(Debug, Clone)]
pub enum GroupReversalOutcome {
    /// Every member was reversed earlier; nothing was posted.
    AlreadyReversed,
    /// Reversals to persist, newest original first.
    Reversed(Vec<GlTransaction>),
}
