//! Strategy selection.

use strata_shared::LedgerConfig;
use tracing::{debug, warn};

use super::{EntryStrategy, TransactionContext, TransactionEntryRequest};
use crate::ledger::error::LedgerError;

/// Picks the entry strategy for a transaction.
///
/// Strategies are tried in registration order and the first one that can
/// handle the context wins.
#[derive(Debug, Clone)]
pub struct StrategyFactory {
    strategies: Vec<EntryStrategy>,
    legacy_default: bool,
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyFactory {
    /// Factory with every strategy registered and no fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: EntryStrategy::REGISTRATION_ORDER.to_vec(),
            legacy_default: false,
        }
    }

    /// Factory configured from [`LedgerConfig`].
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new().with_legacy_default(config.strategy.legacy_default_pending_inbound)
    }

    /// Falls back to [`EntryStrategy::PendingInbound`] in [`Self::get_strategy`]
    /// when nothing matches.
    #[must_use]
    pub const fn with_legacy_default(mut self, enabled: bool) -> Self {
        self.legacy_default = enabled;
        self
    }

    /// Registered strategies, in the order they are tried.
    #[must_use]
    pub fn strategies(&self) -> &[EntryStrategy] {
        &self.strategies
    }

    fn find(&self, context: &TransactionContext<'_>) -> Option<EntryStrategy> {
        self.strategies
            .iter()
            .copied()
            .find(|strategy| strategy.can_handle(context))
    }

    /// Strategy for a transaction context.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoStrategy`] if no strategy matches and the
    /// legacy default is off.
    pub fn get_strategy(
        &self,
        context: &TransactionContext<'_>,
    ) -> Result<EntryStrategy, LedgerError> {
        if let Some(strategy) = self.find(context) {
            debug!(strategy = %strategy, context = %context.describe(), "selected strategy");
            return Ok(strategy);
        }
        if self.legacy_default {
            warn!(
                context = %context.describe(),
                "no strategy matched, using legacy pending inbound default"
            );
            return Ok(EntryStrategy::PendingInbound);
        }
        Err(LedgerError::NoStrategy {
            context: context.describe(),
        })
    }

    /// Strategy for one entry request. Never falls back.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoStrategy`] naming the entry's accounts if no
    /// strategy matches.
    pub fn get_strategy_for_entry(
        &self,
        entry: &TransactionEntryRequest,
        context: &TransactionContext<'_>,
    ) -> Result<EntryStrategy, LedgerError> {
        let strategy = self.find(context).ok_or_else(|| LedgerError::NoStrategy {
            context: format!(
                "{}, debit={}, credit={}",
                context.describe(),
                entry.debit_account,
                entry.credit_account
            ),
        })?;
        debug!(
            strategy = %strategy,
            debit = %entry.debit_account,
            credit = %entry.credit_account,
            "selected strategy for entry"
        );
        Ok(strategy)
    }
}
