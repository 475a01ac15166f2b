//! Property-based tests for the entry strategies.
//!
//! Whatever the strategy, kind or amount, every layer a strategy writes to
//! must balance, and completing a pending transaction must leave nothing on
//! the pending layer.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_shared::types::{CurrencyCode, JournalId};

use super::entry::GlEntry;
use super::executor::EntrySpecExecutor;
use super::layer::{Layer, LayerType};
use super::strategy::fixtures::{chart, payload, request, usd, usd_id};
use super::strategy::{EntryKind, EntryStrategy, base_layer, pending_layer};
use super::tags::Tags;
use super::transaction::GlTransaction;
use super::validation::validate_entries;

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_strategy() -> impl Strategy<Value = EntryKind> {
    prop_oneof![
        Just(EntryKind::Amount),
        Just(EntryKind::Fee),
        Just(EntryKind::Rebate),
        Just(EntryKind::Commission),
        Just(EntryKind::Other("BONUS".to_string())),
    ]
}

fn direct_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        Just(("wallet-a", "wallet-b")),
        Just(("cash", "wallet-a")),
        Just(("wallet-b", "cash")),
    ]
}

/// Payer and a credit-side recipient.
fn inbound_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        Just(("cash", "wallet-a")),
        Just(("cash", "wallet-b")),
        Just(("wallet-a", "wallet-b")),
        Just(("wallet-b", "wallet-a")),
    ]
}

fn currencies_layer() -> BTreeMap<CurrencyCode, Layer> {
    BTreeMap::from([(usd(), base_layer(usd_id()))])
}

fn build(
    strategy: EntryStrategy,
    requests: &[(&str, &str, Decimal, EntryKind)],
    tags: &[&str],
) -> GlTransaction {
    let chart = chart();
    let mut txn = GlTransaction::new(JournalId::new(), "props", Tags::new());
    for (debit, credit, amount, kind) in requests {
        let request = request(debit, credit, *amount, kind);
        let specs = strategy.create_entries(&payload(&chart, &request)).unwrap();
        EntrySpecExecutor::execute_specs(&mut txn, specs).unwrap();
    }
    for tag in tags {
        txn.tags.add(*tag);
    }
    txn
}

fn complete(strategy: EntryStrategy, original: &GlTransaction) -> GlTransaction {
    let mut completion = GlTransaction::new(original.journal, "props-completion", Tags::new());
    strategy
        .complete_transaction(original, &mut completion, &currencies_layer())
        .unwrap();
    completion
}

fn net(entries: &[GlEntry], code: &str, layer: Layer) -> Decimal {
    entries
        .iter()
        .filter(|e| e.account.code == code && e.layer == layer)
        .map(GlEntry::impact)
        .sum()
}

fn combined(original: &GlTransaction, completion: &GlTransaction) -> Vec<GlEntry> {
    let mut all = original.entries().to_vec();
    all.extend_from_slice(completion.entries());
    all
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Direct entries balance on every layer for every kind.
    #[test]
    fn prop_direct_balances(
        pair in direct_pair(),
        amount in amount_strategy(),
        kind in kind_strategy(),
    ) {
        let (debit, credit) = pair;
        let txn = build(EntryStrategy::Direct, &[(debit, credit, amount, kind)], &[]);
        prop_assert!(validate_entries(txn.entries()).is_ok());
        prop_assert!(!txn.touches_band(LayerType::Pending));
    }

    /// Direct transfers move the amount between the two accounts on the base layer.
    #[test]
    fn prop_direct_base_movement(
        pair in direct_pair(),
        amount in amount_strategy(),
    ) {
        let (debit, credit) = pair;
        let txn = build(EntryStrategy::Direct, &[(debit, credit, amount, EntryKind::Amount)], &[]);
        let base = base_layer(usd_id());
        let moved = |code: &str, debit_side: bool| -> Decimal {
            txn.entries()
                .iter()
                .filter(|e| e.layer == base && e.account.code == code && e.is_debit() == debit_side)
                .map(|e| e.amount)
                .sum()
        };
        prop_assert_eq!(moved(debit, true), amount);
        prop_assert_eq!(moved(credit, false), amount);
        prop_assert!(!txn.touches_band(LayerType::Fee));
    }

    /// Pending inbound creation and completion both balance, and the
    /// recipient ends with the amount on the base layer.
    #[test]
    fn prop_pending_inbound_lifecycle(
        pair in inbound_pair(),
        amount in amount_strategy(),
    ) {
        let (debit, credit) = pair;
        let original = build(
            EntryStrategy::PendingInbound,
            &[(debit, credit, amount, EntryKind::Amount)],
            &["group:INBOUND", "type:DEPOSIT"],
        );
        prop_assert!(validate_entries(original.entries()).is_ok());

        let completion = complete(EntryStrategy::PendingInbound, &original);
        prop_assert!(validate_entries(completion.entries()).is_ok());

        let all = combined(&original, &completion);
        prop_assert_eq!(net(&all, credit, base_layer(usd_id())), amount);
        for entry in &all {
            prop_assert_eq!(net(&all, &entry.account.code, pending_layer(usd_id())), Decimal::ZERO);
        }
    }

    /// Bill payments settle the biller, the rebate and the commission.
    #[test]
    fn prop_bill_payment_lifecycle(
        amount in amount_strategy(),
        rebate in amount_strategy(),
        commission in amount_strategy(),
    ) {
        let original = build(
            EntryStrategy::PendingBillPayment,
            &[
                ("wallet-a", "biller", amount, EntryKind::Amount),
                ("wallet-a", "wallet-b", rebate, EntryKind::Rebate),
                ("commission-expense", "wallet-b", commission, EntryKind::Commission),
            ],
            &["group:BILL_PAYMENT", "type:ELECTRICITY"],
        );
        prop_assert!(validate_entries(original.entries()).is_ok());

        let completion = complete(EntryStrategy::PendingBillPayment, &original);
        prop_assert!(validate_entries(completion.entries()).is_ok());

        let all = combined(&original, &completion);
        let base = base_layer(usd_id());
        prop_assert_eq!(net(&all, "biller", base), amount);
        prop_assert_eq!(net(&all, "wallet-b", base), rebate + commission);
        prop_assert_eq!(net(&all, "commission-expense", base), commission);
        prop_assert_eq!(net(&all, "wallet-a", base), -(amount + rebate));
        prop_assert_eq!(net(&all, "wallet-b", pending_layer(usd_id())), Decimal::ZERO);
    }

    /// Direct transactions have nothing to complete.
    #[test]
    fn prop_direct_never_completes(amount in amount_strategy()) {
        let original = build(
            EntryStrategy::Direct,
            &[("wallet-a", "wallet-b", amount, EntryKind::Amount)],
            &["group:P2P", "type:TRANSFER"],
        );
        let mut completion = GlTransaction::new(original.journal, "c", Tags::new());
        prop_assert!(EntryStrategy::Direct
            .complete_transaction(&original, &mut completion, &currencies_layer())
            .is_err());
        prop_assert!(completion.entries().is_empty());
    }
}
