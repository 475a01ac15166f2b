//! Rule orchestration.

use std::collections::BTreeSet;
use std::sync::Arc;

use strata_shared::types::AccountId;
use tracing::{debug, error, warn};

use super::{DoubleEntry, JournalRule, LimitRule, RuleContext};
use crate::ledger::balance::BalanceLookup;
use crate::ledger::currency::CurrencyRegistry;
use crate::ledger::error::{ErrorCategory, LedgerError};
use crate::ledger::layer::{Layer, LayerType};
use crate::ledger::tags::{TagKey, TagMap};
use crate::ledger::transaction::GlTransaction;

/// A registered rule with its scope.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// The rule.
    pub rule: Arc<dyn JournalRule>,
    /// Parameter handed to the rule.
    pub param: Option<String>,
    /// Only entries on this account are offered to the rule.
    pub account: Option<AccountId>,
    /// Layers the rule applies to.
    pub layers: Vec<Layer>,
}

impl RuleEntry {
    /// Registers `rule` on `layers` for every account.
    #[must_use]
    pub fn new(rule: impl JournalRule + 'static, layers: Vec<Layer>) -> Self {
        Self {
            rule: Arc::new(rule),
            param: None,
            account: None,
            layers,
        }
    }

    /// Sets the rule parameter.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Scopes the rule to one account.
    #[must_use]
    pub const fn for_account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }
}

/// Runs rules in registration order; the first rejection wins.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<RuleEntry>,
}

impl RuleEngine {
    /// Engine without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Double entry on every layer, then the daily and cumulative limits on
    /// their layers, for every configured currency.
    #[must_use]
    pub fn standard(currencies: &CurrencyRegistry) -> Self {
        Self::new()
            .with_rule(RuleEntry::new(
                DoubleEntry,
                currencies.layers(&LayerType::ALL),
            ))
            .with_rule(RuleEntry::new(
                LimitRule::daily(),
                currencies.layers(&[LayerType::DailyLimit]),
            ))
            .with_rule(RuleEntry::new(
                LimitRule::cumulative(),
                currencies.layers(&[LayerType::CumulativeLimit]),
            ))
    }

    /// Appends a rule.
    pub fn register(&mut self, entry: RuleEntry) {
        self.rules.push(entry);
    }

    /// Appends a rule, builder style.
    #[must_use]
    pub fn with_rule(mut self, entry: RuleEntry) -> Self {
        self.register(entry);
        self
    }

    /// Registered rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RuleEntry] {
        &self.rules
    }

    /// Evaluates every rule against `transaction`.
    ///
    /// A rule failing with an internal error rejects the transaction as
    /// [`LedgerError::RuleFailed`].
    ///
    /// # Errors
    ///
    /// Returns the first rejection, or [`LedgerError::InvalidLimitTag`] if a
    /// tag read by a registered rule carries an unparseable limit.
    pub fn evaluate(
        &self,
        transaction: &GlTransaction,
        lookup: &dyn BalanceLookup,
    ) -> Result<(), LedgerError> {
        let consumed: BTreeSet<TagKey> = self
            .rules
            .iter()
            .flat_map(|entry| entry.rule.tag_keys())
            .collect();
        let tags = TagMap::parse_consumed(&transaction.tags, &consumed)?;

        for entry in &self.rules {
            let offsets: Vec<usize> = transaction
                .entries()
                .iter()
                .enumerate()
                .filter(|(_, e)| entry.account.is_none_or(|id| e.account.id == id))
                .map(|(i, _)| i)
                .collect();
            let account = match entry.account {
                Some(id) => {
                    let Some(found) = transaction.entries().iter().find(|e| e.account.id == id)
                    else {
                        continue;
                    };
                    Some(found.account.as_ref())
                }
                None => None,
            };

            let ctx = RuleContext {
                lookup,
                transaction,
                tags: &tags,
                param: entry.param.as_deref(),
                account,
                entry_offsets: &offsets,
                layers: &entry.layers,
            };

            let name = entry.rule.name();
            match entry.rule.check(&ctx) {
                Ok(()) => debug!(rule = name, transaction = %transaction.detail, "rule passed"),
                Err(err) if err.category() == ErrorCategory::Internal => {
                    error!(
                        rule = name,
                        transaction = %transaction.detail,
                        error = %err,
                        "rule failed unexpectedly"
                    );
                    return Err(LedgerError::RuleFailed {
                        rule: name.to_string(),
                        source: Box::new(err),
                    });
                }
                Err(err)
                    if err.category() == ErrorCategory::Rejection
                        && !entry.rule.is_error_on_layer_mismatch() =>
                {
                    warn!(
                        rule = name,
                        transaction = %transaction.detail,
                        error = %err,
                        "rule rejection ignored"
                    );
                }
                Err(err) => {
                    warn!(
                        rule = name,
                        transaction = %transaction.detail,
                        error = %err,
                        "transaction rejected"
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
