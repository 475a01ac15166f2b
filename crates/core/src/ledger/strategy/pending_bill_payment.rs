//! Pending bill payments.
//!
//! Only the principal (`AMOUNT`) moves on the base layer, into the liability
//! bridge tagged `credit:<biller>,type:AMOUNT`. Amounts, rebates and
//! commissions are mirrored on the pending layer. Rebate and commission
//! recipients are tagged `debit:<payer>,type:<kind>` so completion knows who
//! pays them.

use std::collections::BTreeMap;

use strata_shared::types::CurrencyCode;
use tracing::warn;

use super::completion::{base_layer_of, find_account, offset_reversal_specs};
use super::pending_inbound::pending_legs;
use super::{EntryBuilderPayload, EntryKind, base_layer, pending_layer};
use crate::ledger::account::{AccountRef, AccountSide, BridgeRole};
use crate::ledger::entry_spec::EntrySpec;
use crate::ledger::error::LedgerError;
use crate::ledger::layer::Layer;
use crate::ledger::tags::Tags;
use crate::ledger::transaction::GlTransaction;

pub(super) fn base_layer_entries(
    payload: &EntryBuilderPayload<'_>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    if payload.entry.kind() != Some(EntryKind::Amount) {
        return Ok(Vec::new());
    }

    let bridge_liability = payload.require_bridge(BridgeRole::Liability)?;
    let layer = base_layer(payload.currency);
    let tags = Tags::new()
        .with(format!("credit:{}", payload.entry.credit_account))
        .with("type:AMOUNT");
    Ok(vec![
        EntrySpec::debit(
            AccountRef::clone(&payload.debit_account),
            payload.amount(),
            layer,
            payload.detail(),
        ),
        EntrySpec::credit(bridge_liability, payload.amount(), layer, payload.detail())
            .with_tags(tags),
    ])
}

pub(super) fn offset_layer_entries(
    payload: &EntryBuilderPayload<'_>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    let bridge_asset = payload.require_bridge(BridgeRole::Asset)?;
    let bridge_liability = payload.require_bridge(BridgeRole::Liability)?;
    let layer = pending_layer(payload.currency);

    match payload.entry.kind() {
        Some(kind @ (EntryKind::Amount | EntryKind::Rebate)) => {
            let recipient_tags = (kind == EntryKind::Rebate).then(|| {
                Tags::new()
                    .with(format!("debit:{}", payload.entry.debit_account))
                    .with("type:REBATE")
            });
            Ok(pending_legs(
                &payload.credit_account,
                &bridge_asset,
                &bridge_liability,
                payload.amount(),
                layer,
                payload.detail(),
                recipient_tags,
            ))
        }
        Some(EntryKind::Commission) => {
            if !payload.debit_account.is_expense() {
                return Err(LedgerError::NonExpenseCommissionAccount(
                    payload.debit_account.code.clone(),
                ));
            }
            let recipient_tags = Tags::new()
                .with(format!("debit:{}", payload.debit_account.code))
                .with("type:COMMISSION");
            // the expense account stands in for the bridge leg on the
            // recipient's side
            let (asset, liability, tags) = match payload.credit_account.side {
                AccountSide::Credit => (
                    &payload.debit_account,
                    &bridge_liability,
                    Some(recipient_tags),
                ),
                AccountSide::Debit => (&bridge_asset, &payload.debit_account, None),
            };
            Ok(pending_legs(
                &payload.credit_account,
                asset,
                liability,
                payload.amount(),
                layer,
                payload.detail(),
                tags,
            ))
        }
        _ => Ok(Vec::new()),
    }
}

/// Unwinds the pending footprint, then settles every tagged leg on the base
/// layer according to its `type` tag.
pub(super) fn completion_entries(
    original: &GlTransaction,
    currencies_layer: &BTreeMap<CurrencyCode, Layer>,
) -> Result<Vec<EntrySpec>, LedgerError> {
    let mut specs = offset_reversal_specs(original, currencies_layer);

    for entry in original.entries() {
        let Some(recipient_code) = entry.tags.get("credit").or_else(|| entry.tags.get("debit"))
        else {
            continue;
        };
        let kind = entry
            .tags
            .get("type")
            .map(EntryKind::parse)
            .ok_or_else(|| LedgerError::MissingTransactionTag {
                key: "type",
                transaction: original.detail.clone(),
            })?;
        let Some(recipient) = find_account(original, recipient_code) else {
            warn!(
                transaction = %original.detail,
                recipient = recipient_code,
                "bill payment recipient not in transaction, leg left on bridge"
            );
            continue;
        };
        let layer = base_layer_of(entry, currencies_layer)?;
        let tagged = AccountRef::clone(&entry.account);

        match kind {
            EntryKind::Rebate | EntryKind::Commission => {
                specs.push(EntrySpec::debit(
                    recipient,
                    entry.amount,
                    layer,
                    format!("Bill payment completion: {}", entry.detail),
                ));
                specs.push(EntrySpec::credit(
                    tagged,
                    entry.amount,
                    layer,
                    "Bridge debit for bill payment",
                ));
            }
            EntryKind::Amount => {
                specs.push(EntrySpec::debit(
                    tagged,
                    entry.amount,
                    layer,
                    "Bridge debit for bill payment",
                ));
                specs.push(EntrySpec::credit(
                    recipient,
                    entry.amount,
                    layer,
                    format!("Bill payment completion: {}", entry.detail),
                ));
            }
            EntryKind::Fee | EntryKind::Other(_) => {}
        }
    }

    Ok(specs)
}
