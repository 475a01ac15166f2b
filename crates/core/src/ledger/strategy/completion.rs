//! Helpers shared by the pending strategies' completion logic.

use std::collections::{BTreeMap, BTreeSet};

use strata_shared::types::CurrencyCode;

use crate::ledger::account::{AccountRef, BridgeRole};
use crate::ledger::entry::GlEntry;
use crate::ledger::entry_spec::EntrySpec;
use crate::ledger::error::LedgerError;
use crate::ledger::layer::{Layer, LayerType};
use crate::ledger::transaction::GlTransaction;

/// Specs that undo every offset-layer entry of `original`.
pub(super) fn offset_reversal_specs(
    original: &GlTransaction,
    currencies_layer: &BTreeMap<CurrencyCode, Layer>,
) -> Vec<EntrySpec> {
    let offset_layers: BTreeSet<Layer> = currencies_layer
        .values()
        .flat_map(|base| LayerType::OFFSET_LAYERS.iter().map(|t| base.with_type(*t)))
        .collect();
    original.reversal_specs(|layer| offset_layers.contains(&layer))
}

/// Base layer of the entry's account currency.
pub(super) fn base_layer_of(
    entry: &GlEntry,
    currencies_layer: &BTreeMap<CurrencyCode, Layer>,
) -> Result<Layer, LedgerError> {
    currencies_layer
        .get(&entry.account.currency_code)
        .copied()
        .ok_or_else(|| LedgerError::UnknownCurrency(entry.account.currency_code.to_string()))
}

/// Account with this code among the entries of `original`.
pub(super) fn find_account(original: &GlTransaction, code: &str) -> Option<AccountRef> {
    original
        .entries()
        .iter()
        .find(|e| e.account.code == code)
        .map(|e| AccountRef::clone(&e.account))
}

/// Liability bridge of the same currency among the entries of `original`.
pub(super) fn find_liability_bridge(
    original: &GlTransaction,
    currency: &CurrencyCode,
) -> Option<AccountRef> {
    original
        .entries()
        .iter()
        .find(|e| {
            e.account.bridge_role() == Some(BridgeRole::Liability)
                && e.account.currency_code == *currency
        })
        .map(|e| AccountRef::clone(&e.account))
}
