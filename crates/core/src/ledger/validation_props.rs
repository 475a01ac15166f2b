//! Property-based tests for entry validation.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_shared::types::{CurrencyCode, LedgerEntryId, TransactionId};

use super::account::{Account, AccountRef, AccountSide};
use super::entry::{EntryType, GlEntry};
use super::layer::{CurrencyId, Layer};
use super::tags::Tags;
use super::validation::{LedgerValidationError, validate_entries};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)]
}

fn layer_strategy() -> impl Strategy<Value = Layer> {
    prop_oneof![
        Just(Layer::from_raw(1)),
        Just(Layer::from_raw(1001)),
        Just(Layer::from_raw(4001)),
    ]
}

fn account() -> AccountRef {
    Arc::new(Account::new(
        "acct",
        AccountSide::Debit,
        CurrencyCode::new("USD").unwrap(),
        CurrencyId::new(1).unwrap(),
    ))
}

fn make_entry(entry_type: EntryType, amount: Decimal, layer: Layer) -> GlEntry {
    GlEntry {
        id: LedgerEntryId::new(),
        transaction_id: TransactionId::new(),
        account: account(),
        layer,
        entry_type,
        amount,
        detail: String::new(),
        tags: Tags::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Zero amounts are rejected.
    #[test]
    fn prop_zero_amount_rejected(
        entry_type in entry_type_strategy(),
        other_amount in positive_amount(),
        layer in layer_strategy(),
    ) {
        let entries = vec![
            make_entry(entry_type, Decimal::ZERO, layer),
            make_entry(entry_type.opposite(), other_amount, layer),
        ];
        let result = validate_entries(&entries);
        prop_assert!(
            matches!(result, Err(LedgerValidationError::InvalidAmount { .. })),
            "zero amount should be rejected, got: {:?}",
            result
        );
    }

    /// Negative amounts are rejected.
    #[test]
    fn prop_negative_amount_rejected(
        entry_type in entry_type_strategy(),
        neg_amount in negative_amount(),
        other_amount in positive_amount(),
    ) {
        let layer = Layer::from_raw(1);
        let entries = vec![
            make_entry(entry_type, neg_amount, layer),
            make_entry(entry_type.opposite(), other_amount, layer),
        ];
        let result = validate_entries(&entries);
        prop_assert!(
            matches!(result, Err(LedgerValidationError::InvalidAmount { .. })),
            "negative amount should be rejected, got: {:?}",
            result
        );
    }

    /// A lone entry never balances its layer.
    #[test]
    fn prop_single_entry_unbalanced(
        entry_type in entry_type_strategy(),
        amount in positive_amount(),
        layer in layer_strategy(),
    ) {
        let result = validate_entries(&[make_entry(entry_type, amount, layer)]);
        prop_assert!(
            matches!(result, Err(LedgerValidationError::Unbalanced { layer: l, .. }) if l == layer),
            "single entry should be unbalanced, got: {:?}",
            result
        );
    }

    /// Mirrored pairs balance on every layer.
    #[test]
    fn prop_mirrored_pairs_balance(
        pairs in prop::collection::vec((positive_amount(), layer_strategy()), 1..10),
    ) {
        let entries: Vec<GlEntry> = pairs
            .iter()
            .flat_map(|(amount, layer)| {
                [
                    make_entry(EntryType::Debit, *amount, *layer),
                    make_entry(EntryType::Credit, *amount, *layer),
                ]
            })
            .collect();
        prop_assert!(validate_entries(&entries).is_ok());
    }

    /// Balance on one layer does not cover another.
    #[test]
    fn prop_cross_layer_pairs_rejected(amount in positive_amount()) {
        let entries = vec![
            make_entry(EntryType::Debit, amount, Layer::from_raw(1)),
            make_entry(EntryType::Credit, amount, Layer::from_raw(1001)),
        ];
        prop_assert!(
            matches!(
                validate_entries(&entries),
                Err(LedgerValidationError::Unbalanced { .. })
            ),
            "entries on different layers must not balance each other"
        );
    }
}

#[test]
fn test_empty_entries_rejected() {
    assert_eq!(validate_entries(&[]), Err(LedgerValidationError::NoEntries));
}
