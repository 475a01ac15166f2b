//! Property-based tests for layer keys.

use proptest::prelude::*;

use super::error::LedgerError;
use super::layer::{BAND_WIDTH, CurrencyId, Layer, LayerType, is_in_band, layer_for};

fn layer_type_strategy() -> impl Strategy<Value = LayerType> {
    prop::sample::select(LayerType::ALL.to_vec())
}

fn currency_strategy() -> impl Strategy<Value = CurrencyId> {
    (0u16..1000).prop_map(|id| CurrencyId::new(id).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Encoding then decoding yields the same type and currency.
    #[test]
    fn prop_decode_inverts_layer_for(
        layer_type in layer_type_strategy(),
        currency in currency_strategy(),
    ) {
        let layer = layer_for(layer_type, currency);
        prop_assert_eq!(layer.decode(), Some((layer_type, currency)));
    }

    /// A layer lies in its own band and no other.
    #[test]
    fn prop_layer_in_exactly_one_band(
        layer_type in layer_type_strategy(),
        currency in currency_strategy(),
    ) {
        let layer = layer_for(layer_type, currency);
        for other in LayerType::ALL {
            prop_assert_eq!(is_in_band(layer, other), other == layer_type);
        }
    }

    /// Moving across bands keeps the currency.
    #[test]
    fn prop_with_type_keeps_currency(
        from in layer_type_strategy(),
        to in layer_type_strategy(),
        currency in currency_strategy(),
    ) {
        let moved = layer_for(from, currency).with_type(to);
        prop_assert_eq!(moved, layer_for(to, currency));
    }

    /// Ids at or beyond the band width are refused.
    #[test]
    fn prop_overflowing_ids_rejected(id in 1000u16..=u16::MAX) {
        let overflow = matches!(
            CurrencyId::new(id),
            Err(LedgerError::BandOverflow { currency_id }) if currency_id == id
        );
        prop_assert!(overflow);
    }

    /// Raw values decode to the band their offset names.
    #[test]
    fn prop_raw_values_decode_by_offset(value in 0u32..7 * BAND_WIDTH) {
        let decoded = Layer::from_raw(value).decode();
        prop_assert!(decoded.is_some());
        let (layer_type, currency) = decoded.unwrap();
        prop_assert_eq!(layer_type.offset(), value - value % BAND_WIDTH);
        prop_assert_eq!(u32::from(currency.get()), value % BAND_WIDTH);
    }
}
