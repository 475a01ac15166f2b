//! Transaction aggregate.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use strata_shared::types::{JournalId, LedgerEntryId, TransactionId};

use super::account::AccountRef;
use super::entry::{EntryType, GlEntry};
use super::entry_spec::EntrySpec;
use super::error::LedgerError;
use super::layer::{Layer, LayerType};
use super::tags::Tags;
use super::validation::LedgerValidationError;

/// Debit and credit totals of one layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTotals {
    /// Sum of debit amounts.
    pub debits: Decimal,
    /// Sum of credit amounts.
    pub credits: Decimal,
}

impl LayerTotals {
    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debits == self.credits
    }
}

/// A general-ledger transaction: an append-only list of entries plus tags.
#[derive(Debug, Clone)]
pub struct GlTransaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Journal the transaction posts to.
    pub journal: JournalId,
    /// Reference / description.
    pub detail: String,
    /// Transaction tags.
    pub tags: Tags,
    /// When the transaction was created.
    pub timestamp: DateTime<Utc>,
    /// Posting date.
    pub post_date: DateTime<Utc>,
    entries: Vec<GlEntry>,
}

impl GlTransaction {
    /// Creates an empty transaction.
    #[must_use]
    pub fn new(journal: JournalId, detail: impl Into<String>, tags: Tags) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            journal,
            detail: detail.into(),
            tags,
            timestamp: now,
            post_date: now,
            entries: Vec::new(),
        }
    }

    /// Entries in posting order.
    #[must_use]
    pub fn entries(&self) -> &[GlEntry] {
        &self.entries
    }

    /// Appends a debit carrying the transaction's tags.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive.
    pub fn create_debit(
        &mut self,
        account: AccountRef,
        amount: Decimal,
        detail: impl Into<String>,
        layer: Layer,
    ) -> Result<&GlEntry, LedgerError> {
        self.create_entry(account, EntryType::Debit, amount, detail.into(), layer)
    }

    /// Appends a credit carrying the transaction's tags.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive.
    pub fn create_credit(
        &mut self,
        account: AccountRef,
        amount: Decimal,
        detail: impl Into<String>,
        layer: Layer,
    ) -> Result<&GlEntry, LedgerError> {
        self.create_entry(account, EntryType::Credit, amount, detail.into(), layer)
    }

    fn create_entry(
        &mut self,
        account: AccountRef,
        entry_type: EntryType,
        amount: Decimal,
        detail: String,
        layer: Layer,
    ) -> Result<&GlEntry, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerValidationError::InvalidAmount {
                account: account.code.clone(),
                amount,
            }
            .into());
        }
        let tags = self.tags.clone();
        Ok(self.push_entry(account, entry_type, amount, layer, detail, tags))
    }

    /// Appends an entry without validation. Callers check amounts first.
    pub(crate) fn push_entry(
        &mut self,
        account: AccountRef,
        entry_type: EntryType,
        amount: Decimal,
        layer: Layer,
        detail: String,
        tags: Tags,
    ) -> &GlEntry {
        let index = self.entries.len();
        self.entries.push(GlEntry {
            id: LedgerEntryId::new(),
            transaction_id: self.id,
            account,
            layer,
            entry_type,
            amount,
            detail,
            tags,
        });
        &self.entries[index]
    }

    /// Mirror specs (direction flipped) for every entry whose layer passes
    /// `include`. Specs carry no tags of their own.
    #[must_use]
    pub fn reversal_specs<F>(&self, include: F) -> Vec<EntrySpec>
    where
        F: Fn(Layer) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| include(e.layer))
            .map(|e| {
                EntrySpec::new(
                    AccountRef::clone(&e.account),
                    e.amount,
                    e.entry_type.opposite(),
                    e.layer,
                    e.detail.clone(),
                )
            })
            .collect()
    }

    /// Full mirror of this transaction, tagged `reverses:<detail>`.
    #[must_use]
    pub fn create_reverse(&self, detail: impl Into<String>) -> Self {
        let tags = self
            .tags
            .clone()
            .with(format!("reverses:{}", self.detail));
        let mut reversal = Self::new(self.journal, detail, tags);
        for entry in &self.entries {
            reversal.push_entry(
                AccountRef::clone(&entry.account),
                entry.entry_type.opposite(),
                entry.amount,
                entry.layer,
                entry.detail.clone(),
                entry.tags.clone(),
            );
        }
        reversal
    }

    /// Layers touched by the transaction.
    #[must_use]
    pub fn layers(&self) -> BTreeSet<Layer> {
        self.entries.iter().map(|e| e.layer).collect()
    }

    /// Debit and credit totals per layer.
    #[must_use]
    pub fn layer_totals(&self) -> BTreeMap<Layer, LayerTotals> {
        let mut totals: BTreeMap<Layer, LayerTotals> = BTreeMap::new();
        for entry in &self.entries {
            let layer = totals.entry(entry.layer).or_default();
            match entry.entry_type {
                EntryType::Debit => layer.debits += entry.amount,
                EntryType::Credit => layer.credits += entry.amount,
            }
        }
        totals
    }

    /// Returns true if any entry lies in the band of `layer_type`.
    #[must_use]
    pub fn touches_band(&self, layer_type: LayerType) -> bool {
        self.entries.iter().any(|e| e.layer.is_in_band(layer_type))
    }

    /// Codes of the accounts touched, in first-use order.
    #[must_use]
    pub fn account_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !codes.contains(&entry.account.code) {
                codes.push(entry.account.code.clone());
            }
        }
        codes
    }

    /// Returns true once the transaction is tagged `completed:true`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.tags.contains("completed:true")
    }

    /// Returns true once the transaction is tagged `reversed:true`.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.tags.contains("reversed:true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::{Account, AccountSide};
    use crate::ledger::layer::CurrencyId;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use strata_shared::types::CurrencyCode;

    fn account(code: &str, side: AccountSide) -> AccountRef {
        Arc::new(Account::new(
            code,
            side,
            CurrencyCode::new("USD").unwrap(),
            CurrencyId::new(1).unwrap(),
        ))
    }

    fn transfer() -> GlTransaction {
        let mut txn = GlTransaction::new(JournalId::new(), "ref-1", Tags::parse("channel:web"));
        let a = account("wallet-a", AccountSide::Credit);
        let b = account("wallet-b", AccountSide::Credit);
        txn.create_debit(a, dec!(100), "transfer", Layer::from_raw(1))
            .unwrap();
        txn.create_credit(b, dec!(100), "transfer", Layer::from_raw(1))
            .unwrap();
        txn
    }

    #[test]
    fn test_eager_entries_inherit_tags() {
        let txn = transfer();
        assert_eq!(txn.entries().len(), 2);
        assert!(txn.entries().iter().all(|e| e.tags.to_string() == "channel:web"));
        assert!(txn.entries().iter().all(|e| e.transaction_id == txn.id));
    }

    #[test]
    fn test_create_rejects_non_positive() {
        let mut txn = GlTransaction::new(JournalId::new(), "ref", Tags::new());
        let a = account("wallet-a", AccountSide::Credit);
        assert!(
            txn.create_debit(Arc::clone(&a), Decimal::ZERO, "x", Layer::BASE)
                .is_err()
        );
        assert!(txn.create_credit(a, dec!(-1), "x", Layer::BASE).is_err());
        assert!(txn.entries().is_empty());
    }

    #[test]
    fn test_layer_totals() {
        let totals = transfer().layer_totals();
        let base = totals[&Layer::from_raw(1)];
        assert_eq!(base.debits, dec!(100));
        assert_eq!(base.credits, dec!(100));
        assert!(base.is_balanced());
    }

    #[test]
    fn test_create_reverse_flips_everything() {
        let txn = transfer();
        let reversal = txn.create_reverse("ref-1-rev");
        assert_eq!(reversal.entries().len(), 2);
        assert_eq!(reversal.entries()[0].entry_type, EntryType::Credit);
        assert_eq!(reversal.entries()[1].entry_type, EntryType::Debit);
        assert!(reversal.tags.contains("reverses:ref-1"));
        assert_eq!(reversal.journal, txn.journal);
    }

    #[test]
    fn test_reversal_specs_filter_layers() {
        let mut txn = transfer();
        let a = account("wallet-a", AccountSide::Credit);
        txn.create_debit(Arc::clone(&a), dec!(5), "pending", Layer::from_raw(1001))
            .unwrap();
        let specs = txn.reversal_specs(|l| l.is_in_band(LayerType::Pending));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].entry_type, EntryType::Credit);
        assert_eq!(specs[0].layer.value(), 1001);
        assert!(specs[0].tags.is_none());
    }

    #[test]
    fn test_markers() {
        let mut txn = transfer();
        assert!(!txn.is_completed());
        txn.tags.add("completed:true");
        assert!(txn.is_completed());
        assert!(!txn.is_reversed());
        assert_eq!(txn.account_codes(), vec!["wallet-a", "wallet-b"]);
        assert!(txn.touches_band(LayerType::Base));
        assert!(!txn.touches_band(LayerType::Pending));
    }
}
