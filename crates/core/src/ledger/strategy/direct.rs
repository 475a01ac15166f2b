//! Direct (non-pending) transactions.

use super::{
    EntryBuilderPayload, EntryKind, base_layer, cumulative_limit_layer, daily_limit_layer,
    fee_layer,
};
use crate::ledger::account::AccountRef;
use crate::ledger::entry_spec::EntrySpec;
use crate::ledger::tags::Tags;

const LIMIT_DETAIL: &str = "transaction_limit";

pub(super) fn base_layer_entries(payload: &EntryBuilderPayload<'_>) -> Vec<EntrySpec> {
    let layer = base_layer(payload.currency);
    vec![
        EntrySpec::debit(
            AccountRef::clone(&payload.debit_account),
            payload.amount(),
            layer,
            payload.detail(),
        ),
        EntrySpec::credit(
            AccountRef::clone(&payload.credit_account),
            payload.amount(),
            layer,
            payload.detail(),
        ),
    ]
}

/// Fees are mirrored on the fee layer, carrying the fee limit when one is set.
pub(super) fn offset_layer_entries(payload: &EntryBuilderPayload<'_>) -> Vec<EntrySpec> {
    if payload.entry.kind() != Some(EntryKind::Fee) {
        return Vec::new();
    }

    let layer = fee_layer(payload.currency);
    let tags = payload
        .entry
        .fee_limit()
        .map(|limit| Tags::new().with(format!("fee_limit:{limit}")));
    let mut debit = EntrySpec::debit(
        AccountRef::clone(&payload.debit_account),
        payload.amount(),
        layer,
        payload.detail(),
    );
    let mut credit = EntrySpec::credit(
        AccountRef::clone(&payload.credit_account),
        payload.amount(),
        layer,
        payload.detail(),
    );
    debit.tags.clone_from(&tags);
    credit.tags = tags;
    vec![debit, credit]
}

/// Amount entries record their usage on the daily and cumulative limit
/// layers of the payer, balanced against the asset bridge.
pub(super) fn limit_entries(payload: &EntryBuilderPayload<'_>) -> Vec<EntrySpec> {
    if payload.entry.kind() != Some(EntryKind::Amount) || payload.entry.skip_limits() {
        return Vec::new();
    }
    if payload.debit_account.is_bridge() {
        return Vec::new();
    }
    let Some(bridge_asset) = payload.bridge_asset.as_ref() else {
        return Vec::new();
    };

    let amount = payload.amount();
    [
        daily_limit_layer(payload.currency),
        cumulative_limit_layer(payload.currency),
    ]
    .into_iter()
    .flat_map(|layer| {
        [
            EntrySpec::debit(AccountRef::clone(bridge_asset), amount, layer, LIMIT_DETAIL),
            EntrySpec::credit(
                AccountRef::clone(&payload.debit_account),
                amount,
                layer,
                LIMIT_DETAIL,
            ),
        ]
    })
    .collect()
}
