//! Property-based tests for the daily and cumulative limit rules.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_shared::types::{CurrencyCode, JournalId};

use super::account::{Account, AccountRef, AccountSide, BridgeRole};
use super::balance::InMemoryBalances;
use super::entry_spec::EntrySpec;
use super::error::LedgerError;
use super::executor::EntrySpecExecutor;
use super::layer::{CurrencyId, Layer, LayerType};
use super::rules::{LimitKind, LimitRule, RuleEngine, RuleEntry};
use super::tags::Tags;
use super::transaction::GlTransaction;

fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (1i64..max).prop_map(|c| Decimal::new(c, 2))
}

fn kind_strategy() -> impl Strategy<Value = LimitKind> {
    prop_oneof![Just(LimitKind::Daily), Just(LimitKind::Cumulative)]
}

fn usd_id() -> CurrencyId {
    CurrencyId::new(1).unwrap()
}

fn wallet() -> AccountRef {
    Arc::new(Account::new(
        "wallet-a",
        AccountSide::Credit,
        CurrencyCode::new("USD").unwrap(),
        usd_id(),
    ))
}

fn bridge() -> AccountRef {
    Arc::new(Account::bridge(
        "bridge-assets-usd",
        BridgeRole::Asset,
        CurrencyCode::new("USD").unwrap(),
        usd_id(),
    ))
}

fn rule_for(kind: LimitKind) -> LimitRule {
    match kind {
        LimitKind::Daily => LimitRule::daily(),
        LimitKind::Cumulative => LimitRule::cumulative(),
    }
}

/// Evaluates one limit rule against a usage of `amount` on the wallet.
fn evaluate(
    kind: LimitKind,
    tags: Tags,
    current: Decimal,
    amount: Decimal,
) -> Result<(), LedgerError> {
    let wallet = wallet();
    let layer = Layer::of(kind.layer_type(), usd_id());
    let journal = JournalId::new();

    let mut balances = InMemoryBalances::new();
    balances.set(journal, &wallet, layer, current);

    let mut txn = GlTransaction::new(journal, "usage", tags);
    EntrySpecExecutor::execute_specs(
        &mut txn,
        vec![
            EntrySpec::debit(bridge(), amount, layer, "transaction_limit"),
            EntrySpec::credit(Arc::clone(&wallet), amount, layer, "transaction_limit"),
        ],
    )?;

    RuleEngine::new()
        .with_rule(RuleEntry::new(rule_for(kind), vec![layer]))
        .evaluate(&txn, &balances)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A usage is accepted exactly when the projected balance stays within the limit.
    #[test]
    fn prop_accepts_iff_within_limit(
        kind in kind_strategy(),
        limit in cents(1_000_000),
        current in cents(1_000_000),
        amount in cents(1_000_000),
    ) {
        let tags = Tags::new().with(format!("{}:{limit}", kind.tag_key().as_str()));
        let result = evaluate(kind, tags, current, amount);
        prop_assert_eq!(result.is_ok(), current + amount <= limit);
        if let Err(err) = result {
            let is_limit = matches!(err, LedgerError::LimitExceeded { kind: k, .. } if k == kind);
            prop_assert!(is_limit);
        }
    }

    /// Landing exactly on the limit is allowed.
    #[test]
    fn prop_exact_limit_allowed(
        kind in kind_strategy(),
        current in cents(100_000),
        amount in cents(100_000),
    ) {
        let limit = current + amount;
        let tags = Tags::new().with(format!("{}:{limit}", kind.tag_key().as_str()));
        prop_assert!(evaluate(kind, tags, current, amount).is_ok());
    }

    /// Without the limit tag the rule never rejects.
    #[test]
    fn prop_no_tag_never_rejects(
        kind in kind_strategy(),
        current in cents(1_000_000),
        amount in cents(1_000_000),
    ) {
        prop_assert!(evaluate(kind, Tags::new(), current, amount).is_ok());
    }

    /// A limit tag for the other band does not constrain this one.
    #[test]
    fn prop_other_band_tag_ignored(
        current in cents(1_000_000),
        amount in cents(1_000_000),
    ) {
        let tags = Tags::new().with("cumulative_limit:0.01");
        prop_assert!(evaluate(LimitKind::Daily, tags, current, amount).is_ok());
    }
}

#[test]
fn test_limit_layers_follow_kind() {
    assert_eq!(LimitKind::Daily.layer_type(), LayerType::DailyLimit);
    assert_eq!(LimitKind::Cumulative.layer_type(), LayerType::CumulativeLimit);
}
