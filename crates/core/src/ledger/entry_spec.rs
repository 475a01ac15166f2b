//! Entry specs and the entry builder DSL.
//!
//! An [`EntrySpec`] describes one intended debit or credit before it becomes a
//! [`GlEntry`]. Strategies batch specs and hand them to the
//! [`EntrySpecExecutor`]; ad-hoc callers use [`entry`] and post straight to a
//! transaction.
//!
//! ```ignore
//! entry(&wallet, dec!(10), layer, "top-up").tags("fee_limit:5".into()).credit(&mut txn)?;
//! let spec = entry(&cash, dec!(10), layer, "top-up").spec(EntryType::Debit);
//! ```

use rust_decimal::Decimal;

use super::account::AccountRef;
use super::entry::{EntryType, GlEntry};
use super::error::LedgerError;
use super::executor::EntrySpecExecutor;
use super::layer::Layer;
use super::tags::Tags;
use super::transaction::GlTransaction;

/// One intended ledger entry.
#[derive(Debug, Clone)]
pub struct EntrySpec {
    /// Account to post to.
    pub account: AccountRef,
    /// Positive magnitude.
    pub amount: Decimal,
    /// Direction.
    pub entry_type: EntryType,
    /// Target layer.
    pub layer: Layer,
    /// Line description.
    pub detail: String,
    /// Entry-specific tags, appended to the transaction's tags.
    pub tags: Option<Tags>,
}

impl EntrySpec {
    /// Creates a spec without entry-specific tags.
    #[must_use]
    pub fn new(
        account: AccountRef,
        amount: Decimal,
        entry_type: EntryType,
        layer: Layer,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            account,
            amount,
            entry_type,
            layer,
            detail: detail.into(),
            tags: None,
        }
    }

    /// Debit spec.
    #[must_use]
    pub fn debit(account: AccountRef, amount: Decimal, layer: Layer, detail: impl Into<String>) -> Self {
        Self::new(account, amount, EntryType::Debit, layer, detail)
    }

    /// Credit spec.
    #[must_use]
    pub fn credit(account: AccountRef, amount: Decimal, layer: Layer, detail: impl Into<String>) -> Self {
        Self::new(account, amount, EntryType::Credit, layer, detail)
    }

    /// Attaches entry-specific tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = Some(tags.into());
        self
    }
}

/// Starts building an entry.
#[must_use]
pub fn entry(account: &AccountRef, amount: Decimal, layer: Layer, detail: impl Into<String>) -> EntryBuilder {
    EntryBuilder {
        account: AccountRef::clone(account),
        amount,
        layer,
        detail: detail.into(),
        tags: None,
    }
}

/// Builder returned by [`entry`].
#[derive(Debug, Clone)]
#[must_use]
pub struct EntryBuilder {
    account: AccountRef,
    amount: Decimal,
    layer: Layer,
    detail: String,
    tags: Option<Tags>,
}

impl EntryBuilder {
    /// Attaches entry-specific tags.
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Finishes as a spec for later execution.
    #[must_use]
    pub fn spec(self, entry_type: EntryType) -> EntrySpec {
        EntrySpec {
            account: self.account,
            amount: self.amount,
            entry_type,
            layer: self.layer,
            detail: self.detail,
            tags: self.tags,
        }
    }

    /// Posts a debit to `transaction` right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive.
    pub fn debit(self, transaction: &mut GlTransaction) -> Result<&GlEntry, LedgerError> {
        EntrySpecExecutor::execute_spec(transaction, self.spec(EntryType::Debit))
    }

    /// Posts a credit to `transaction` right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive.
    pub fn credit(self, transaction: &mut GlTransaction) -> Result<&GlEntry, LedgerError> {
        EntrySpecExecutor::execute_spec(transaction, self.spec(EntryType::Credit))
    }
}
