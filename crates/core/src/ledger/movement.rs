//! Movement reports.
//!
//! A movement report explains a transaction layer by layer: which account
//! paid which, for how much, and whether each layer balances.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::entry::{EntryType, GlEntry};
use super::layer::{Layer, LayerType};
use super::transaction::GlTransaction;

/// A debit paired with a credit of the same amount and detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movement {
    /// Debited account code.
    pub debit_account: String,
    /// Credited account code.
    pub credit_account: String,
    /// Amount moved.
    pub amount: Decimal,
    /// Line description.
    pub detail: String,
}

/// An entry without a counterpart of the same amount and detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedEntry {
    /// Account code.
    pub account: String,
    /// Direction.
    pub entry_type: EntryType,
    /// Amount.
    pub amount: Decimal,
    /// Line description.
    pub detail: String,
}

/// Movements on one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerMovements {
    /// The layer.
    pub layer: Layer,
    /// Band name, `Unknown` outside the known bands.
    pub layer_name: &'static str,
    /// Currency id part of the layer.
    pub currency_id: u16,
    /// Paired entries.
    pub movements: Vec<Movement>,
    /// Entries left unpaired.
    pub unmatched: Vec<UnmatchedEntry>,
    /// Sum of debits.
    pub total_debits: Decimal,
    /// Sum of credits.
    pub total_credits: Decimal,
}

impl LayerMovements {
    /// Returns true if the layer balances.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }
}

/// Per-layer account of a transaction's entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementReport {
    /// Label of the report, usually the operation.
    pub label: String,
    /// Transaction detail.
    pub transaction: String,
    /// Layers in ascending order.
    pub layers: Vec<LayerMovements>,
}

impl MovementReport {
    /// Builds the report for `transaction`.
    #[must_use]
    pub fn from_transaction(transaction: &GlTransaction, label: impl Into<String>) -> Self {
        let layers = transaction
            .layers()
            .into_iter()
            .map(|layer| {
                let entries: Vec<&GlEntry> = transaction
                    .entries()
                    .iter()
                    .filter(|e| e.layer == layer)
                    .collect();
                layer_movements(layer, &entries)
            })
            .collect();
        Self {
            label: label.into(),
            transaction: transaction.detail.clone(),
            layers,
        }
    }

    /// Returns true if every layer balances.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.layers.iter().all(LayerMovements::is_balanced)
    }

    /// Emits the report as a debug event.
    pub fn log(&self) {
        debug!(
            label = %self.label,
            transaction = %self.transaction,
            layers = self.layers.len(),
            balanced = self.is_balanced(),
            "movements:\n{self}"
        );
    }
}

fn layer_movements(layer: Layer, entries: &[&GlEntry]) -> LayerMovements {
    let mut credits: Vec<Option<&GlEntry>> = entries
        .iter()
        .copied()
        .filter(|e| e.is_credit())
        .map(Some)
        .collect();
    let mut movements = Vec::new();
    let mut unmatched = Vec::new();

    for debit in entries.iter().copied().filter(|e| e.is_debit()) {
        let pair = credits.iter_mut().find(|slot| {
            slot.is_some_and(|c| c.amount == debit.amount && c.detail == debit.detail)
        });
        match pair.and_then(Option::take) {
            Some(credit) => movements.push(Movement {
                debit_account: debit.account.code.clone(),
                credit_account: credit.account.code.clone(),
                amount: debit.amount,
                detail: debit.detail.clone(),
            }),
            None => unmatched.push(unmatched_entry(debit)),
        }
    }
    unmatched.extend(credits.into_iter().flatten().map(unmatched_entry));

    let (total_debits, total_credits) = entries.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(dr, cr), e| match e.entry_type {
            EntryType::Debit => (dr + e.amount, cr),
            EntryType::Credit => (dr, cr + e.amount),
        },
    );

    LayerMovements {
        layer,
        layer_name: layer.layer_type().map_or("Unknown", LayerType::name),
        currency_id: layer.currency_id().get(),
        movements,
        unmatched,
        total_debits,
        total_credits,
    }
}

fn unmatched_entry(entry: &GlEntry) -> UnmatchedEntry {
    UnmatchedEntry {
        account: entry.account.code.clone(),
        entry_type: entry.entry_type,
        amount: entry.amount,
        detail: entry.detail.clone(),
    }
}

impl fmt::Display for MovementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.label, self.transaction)?;
        for layer in &self.layers {
            writeln!(
                f,
                "  layer {} ({}, currency {}) debits {} credits {}",
                layer.layer, layer.layer_name, layer.currency_id, layer.total_debits, layer.total_credits
            )?;
            for m in &layer.movements {
                writeln!(
                    f,
                    "    {} -> {}: {} ({})",
                    m.debit_account, m.credit_account, m.amount, m.detail
                )?;
            }
            for u in &layer.unmatched {
                writeln!(
                    f,
                    "    unmatched {:?} {}: {} ({})",
                    u.entry_type, u.account, u.amount, u.detail
                )?;
            }
        }
        Ok(())
    }
}
