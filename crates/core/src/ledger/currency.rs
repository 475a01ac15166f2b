//! Configured currencies and their layer ids.

use std::collections::{BTreeMap, BTreeSet};

use strata_shared::LedgerConfig;
use strata_shared::types::CurrencyCode;

use super::error::LedgerError;
use super::layer::{CurrencyId, Layer, LayerType};

/// Maps currency codes to the ids added to layer offsets.
#[derive(Debug, Clone, Default)]
pub struct CurrencyRegistry {
    by_code: BTreeMap<CurrencyCode, CurrencyId>,
}

impl CurrencyRegistry {
    /// Builds a registry, validating every id against the band width.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BandOverflow`] for ids that do not fit a band and
    /// [`LedgerError::DuplicateCurrency`] for repeated codes or ids.
    pub fn new<I>(currencies: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (CurrencyCode, u16)>,
    {
        let mut by_code = BTreeMap::new();
        let mut ids = BTreeSet::new();
        for (code, raw_id) in currencies {
            let id = CurrencyId::new(raw_id)?;
            if !ids.insert(id) {
                return Err(LedgerError::DuplicateCurrency(format!("id {raw_id}")));
            }
            if by_code.contains_key(&code) {
                return Err(LedgerError::DuplicateCurrency(code.to_string()));
            }
            by_code.insert(code, id);
        }
        Ok(Self { by_code })
    }

    /// Builds the registry from the `currencies` section of the configuration.
    ///
    /// # Errors
    ///
    /// See [`CurrencyRegistry::new`].
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Self::new(config.currencies.iter().map(|c| (c.code.clone(), c.id)))
    }

    /// Id of a currency.
    #[must_use]
    pub fn get(&self, code: &CurrencyCode) -> Option<CurrencyId> {
        self.by_code.get(code).copied()
    }

    /// Id of a currency that must be configured.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownCurrency`] if the code is not configured.
    pub fn id_of(&self, code: &CurrencyCode) -> Result<CurrencyId, LedgerError> {
        self.get(code)
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_string()))
    }

    /// Base layer of every currency, keyed by code.
    #[must_use]
    pub fn currencies_layer(&self) -> BTreeMap<CurrencyCode, Layer> {
        self.by_code
            .iter()
            .map(|(code, id)| (code.clone(), Layer::of(LayerType::Base, *id)))
            .collect()
    }

    /// Every layer of the given types across all currencies.
    #[must_use]
    pub fn layers(&self, types: &[LayerType]) -> Vec<Layer> {
        self.by_code
            .values()
            .flat_map(|id| types.iter().map(move |t| Layer::of(*t, *id)))
            .collect()
    }

    /// Iterates over `(code, id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, CurrencyId)> {
        self.by_code.iter().map(|(code, id)| (code, *id))
    }

    /// Number of currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Returns true if no currency is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: &str) -> CurrencyCode {
        CurrencyCode::new(c).unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CurrencyRegistry::new([(code("USD"), 1), (code("EUR"), 2)]).unwrap();
        assert_eq!(registry.id_of(&code("EUR")).unwrap().get(), 2);
        assert!(matches!(
            registry.id_of(&code("GBP")),
            Err(LedgerError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_registry_rejects_overflow() {
        let result = CurrencyRegistry::new([(code("USD"), 1000)]);
        assert!(matches!(
            result,
            Err(LedgerError::BandOverflow { currency_id: 1000 })
        ));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        assert!(matches!(
            CurrencyRegistry::new([(code("USD"), 1), (code("EUR"), 1)]),
            Err(LedgerError::DuplicateCurrency(_))
        ));
        assert!(matches!(
            CurrencyRegistry::new([(code("USD"), 1), (code("usd"), 2)]),
            Err(LedgerError::DuplicateCurrency(_))
        ));
    }

    #[test]
    fn test_currencies_layer_and_layers() {
        let registry = CurrencyRegistry::new([(code("USD"), 1), (code("EUR"), 2)]).unwrap();
        let base = registry.currencies_layer();
        assert_eq!(base[&code("USD")].value(), 1);
        assert_eq!(base[&code("EUR")].value(), 2);

        let mut daily: Vec<u32> = registry
            .layers(&[LayerType::DailyLimit])
            .into_iter()
            .map(Layer::value)
            .collect();
        daily.sort_unstable();
        assert_eq!(daily, vec![4001, 4002]);
    }

    #[test]
    fn test_from_config() {
        let config = LedgerConfig::from_toml(
            r#"
            [[currencies]]
            code = "NGN"
            id = 566
            "#,
        )
        .unwrap();
        let registry = CurrencyRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_of(&code("NGN")).unwrap().get(), 566);
    }
}
