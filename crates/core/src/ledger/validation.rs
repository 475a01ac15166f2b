//! Structural validation of entries and entry specs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use super::entry::GlEntry;
use super::entry_spec::EntrySpec;
use super::layer::Layer;
use super::transaction::LayerTotals;

/// Validation errors for ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerValidationError {
    /// Entries on one layer do not balance.
    #[error("Layer {layer} is unbalanced: debits ({debits}) != credits ({credits})")]
    Unbalanced {
        /// The unbalanced layer.
        layer: Layer,
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// Transaction has no entries.
    #[error("Transaction must have at least one entry")]
    NoEntries,

    /// Entry amount is zero or negative.
    #[error("Entry amount for account {account} must be positive, got {amount}")]
    InvalidAmount {
        /// Account code.
        account: String,
        /// Offending amount.
        amount: Decimal,
    },
}

/// Validates that entries exist, are positive and balance on every layer.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_entries(entries: &[GlEntry]) -> Result<(), LedgerValidationError> {
    if entries.is_empty() {
        return Err(LedgerValidationError::NoEntries);
    }

    let mut totals: BTreeMap<Layer, LayerTotals> = BTreeMap::new();
    for entry in entries {
        if entry.amount <= Decimal::ZERO {
            return Err(LedgerValidationError::InvalidAmount {
                account: entry.account.code.clone(),
                amount: entry.amount,
            });
        }
        let layer = totals.entry(entry.layer).or_default();
        if entry.is_debit() {
            layer.debits += entry.amount;
        } else {
            layer.credits += entry.amount;
        }
    }

    for (layer, total) in totals {
        if !total.is_balanced() {
            return Err(LedgerValidationError::Unbalanced {
                layer,
                debits: total.debits,
                credits: total.credits,
            });
        }
    }

    Ok(())
}

/// Validates that every spec carries a positive amount.
///
/// # Errors
///
/// Returns [`LedgerValidationError::InvalidAmount`] for the first bad spec.
pub fn validate_specs(specs: &[EntrySpec]) -> Result<(), LedgerValidationError> {
    match specs.iter().find(|s| s.amount <= Decimal::ZERO) {
        Some(spec) => Err(LedgerValidationError::InvalidAmount {
            account: spec.account.code.clone(),
            amount: spec.amount,
        }),
        None => Ok(()),
    }
}
