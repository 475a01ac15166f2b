//! Pending inbound transactions.
//!
//! The payer is debited on the base layer against the liability bridge, and
//! the bridge entry is tagged `credit:<recipient>`. The recipient only sees the
//! funds on the pending layer until the transaction completes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use strata_shared::types::CurrencyCode;

use super::completion::{base_layer_of, find_account, find_liability_bridge, offset_reversal_specs};
use super::{EntryBuilderPayload, base_layer, pending_layer};
use crate::ledger::account::{AccountRef, AccountSide, BridgeRole};
use crate::ledger::entry_spec::EntrySpec;
use crate::ledger::error::LedgerError;
use crate::ledger::layer::Layer;
use crate::ledger::tags::Tags;
use crate::ledger::transaction::GlTransaction;

pub(super) fn base_layer_entries(
    payload: &EntryBuilderPayload<'_>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    let bridge_liability = payload.require_bridge(BridgeRole::Liability)?;
    let layer = base_layer(payload.currency);
    Ok(vec![
        EntrySpec::debit(
            AccountRef::clone(&payload.debit_account),
            payload.amount(),
            layer,
            payload.detail(),
        ),
        EntrySpec::credit(bridge_liability, payload.amount(), layer, payload.detail())
            .with_tags(Tags::new().with(format!("credit:{}", payload.entry.credit_account))),
    ])
}

pub(super) fn offset_layer_entries(
    payload: &EntryBuilderPayload<'_>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    let bridge_asset = payload.require_bridge(BridgeRole::Asset)?;
    let bridge_liability = payload.require_bridge(BridgeRole::Liability)?;
    Ok(pending_entries(
        payload,
        &bridge_asset,
        &bridge_liability,
        None,
    ))
}

/// Pending-layer legs towards the recipient, shaped by the recipient's side.
///
/// A credit-side recipient is credited through both bridges; a debit-side
/// recipient is debited against `liability` directly. `recipient_tags`
/// lands on the recipient's entry.
pub(super) fn pending_legs(
    recipient: &AccountRef,
    asset: &AccountRef,
    liability: &AccountRef,
    amount: Decimal,
    layer: Layer,
    detail: &str,
    recipient_tags: Option<Tags>,
) -> Vec<EntrySpec> {
    match recipient.side {
        AccountSide::Credit => {
            let mut to_recipient =
                EntrySpec::credit(AccountRef::clone(recipient), amount, layer, detail);
            to_recipient.tags = recipient_tags;
            vec![
                EntrySpec::debit(AccountRef::clone(asset), amount, layer, detail),
                EntrySpec::credit(AccountRef::clone(liability), amount, layer, detail),
                EntrySpec::debit(AccountRef::clone(liability), amount, layer, detail),
                to_recipient,
            ]
        }
        AccountSide::Debit => {
            let mut to_recipient =
                EntrySpec::debit(AccountRef::clone(recipient), amount, layer, detail);
            to_recipient.tags = recipient_tags;
            vec![
                to_recipient,
                EntrySpec::credit(AccountRef::clone(liability), amount, layer, detail),
            ]
        }
    }
}

fn pending_entries(
    payload: &EntryBuilderPayload<'_>,
    asset: &AccountRef,
    liability: &AccountRef,
    recipient_tags: Option<Tags>,
) -> Vec<EntrySpec> {
    pending_legs(
        &payload.credit_account,
        asset,
        liability,
        payload.amount(),
        pending_layer(payload.currency),
        payload.detail(),
        recipient_tags,
    )
}

/// Unwinds the pending footprint and moves tagged funds on the base layer.
pub(super) fn completion_entries(
    original: &GlTransaction,
    currencies_layer: &BTreeMap<CurrencyCode, Layer>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    let mut specs = offset_reversal_specs(original, currencies_layer);

    for entry in original.entries() {
        let Some(code) = entry.tags.get("credit") else {
            continue;
        };
        let recipient = find_account(original, code)
            .ok_or_else(|| LedgerError::RecipientNotFound(code.to_string()))?;
        let layer = base_layer_of(entry, currencies_layer)?;
        specs.push(EntrySpec::credit(
            recipient,
            entry.amount,
            layer,
            format!("Completion credit for {}", entry.detail),
        ));
        specs.push(EntrySpec::debit(
            AccountRef::clone(&entry.account),
            entry.amount,
            layer,
            "Bridge debit for completion",
        ));
    }

    for entry in original.entries() {
        let Some(code) = entry.tags.get("debit") else {
            continue;
        };
        let recipient = find_account(original, code)
            .ok_or_else(|| LedgerError::RecipientNotFound(code.to_string()))?;
        let bridge = find_liability_bridge(original, &entry.account.currency_code).ok_or_else(
            || LedgerError::MissingBridgeAccount {
                role: BridgeRole::Liability,
                currency: entry.account.currency_code.to_string(),
            },
        )?;
        let layer = base_layer_of(entry, currencies_layer)?;
        specs.push(EntrySpec::debit(
            recipient,
            entry.amount,
            layer,
            format!("Completion debit for {}", entry.detail),
        ));
        specs.push(EntrySpec::credit(
            bridge,
            entry.amount,
            layer,
            "Bridge credit for completion",
        ));
    }

    Ok(specs)
}
