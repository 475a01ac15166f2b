//! Ledger configuration management.

use serde::Deserialize;
use uuid::Uuid;

use crate::types::CurrencyCode;

/// Configuration consumed by the ledger core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// Currencies known to the ledger and their numeric ids.
    #[serde(default)]
    pub currencies: Vec<CurrencyConfig>,
    /// Strategy selection settings.
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Movement report settings.
    #[serde(default)]
    pub movements: MovementsConfig,
    /// Default journal for new transactions.
    #[serde(default)]
    pub journal: Option<Uuid>,
}

/// One configured currency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code.
    pub code: CurrencyCode,
    /// Numeric id added to layer offsets. Must stay below the band width.
    pub id: u16,
}

/// Strategy selection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyConfig {
    /// When no strategy matches a context, fall back to the pending inbound
    /// strategy instead of failing. Only the context-only lookup honors it.
    #[serde(default)]
    pub legacy_default_pending_inbound: bool,
}

/// Movement report settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementsConfig {
    /// Emit a movement report for every posted transaction.
    #[serde(default)]
    pub log: bool,
}

impl LedgerConfig {
    /// Loads configuration from `.env`, config files and `STRATA__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/ledger").required(false))
            .add_source(
                config::File::with_name(&format!("config/ledger.{run_mode}")).required(false),
            )
            .add_source(config::Environment::with_prefix("STRATA").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid ledger configuration.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
