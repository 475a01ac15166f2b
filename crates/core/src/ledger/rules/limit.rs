//! Daily and cumulative limit rules.
//!
//! Limit usage is recorded as entries on the daily or cumulative limit layer
//! of the paying account. A rule projects the account's balance on that layer
//! after the transaction and rejects it when the projection goes above the
//! limit carried in the transaction's tags.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use tracing::{error, warn};

use super::{JournalRule, RuleContext};
use crate::ledger::account::Account;
use crate::ledger::error::{LedgerError, LimitBreach};
use crate::ledger::layer::{Layer, LayerType};
use crate::ledger::tags::TagKey;
use crate::ledger::transaction::GlTransaction;

/// Which limit a rule enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Usage is netted back to zero by a daily reset transaction.
    Daily,
    /// Never resets.
    Cumulative,
}

impl LimitKind {
    /// Tag carrying the limit amount.
    #[must_use]
    pub const fn tag_key(self) -> TagKey {
        match self {
            Self::Daily => TagKey::DailyLimit,
            Self::Cumulative => TagKey::CumulativeLimit,
        }
    }

    /// Layer band holding the usage.
    #[must_use]
    pub const fn layer_type(self) -> LayerType {
        match self {
            Self::Daily => LayerType::DailyLimit,
            Self::Cumulative => LayerType::CumulativeLimit,
        }
    }

    /// Name of the rule enforcing this limit.
    #[must_use]
    pub const fn rule_name(self) -> &'static str {
        match self {
            Self::Daily => "DailyLimitRule",
            Self::Cumulative => "CumulativeLimitRule",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("Daily"),
            Self::Cumulative => f.write_str("Cumulative"),
        }
    }
}

/// Balance on a limit layer before and after a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitProjection {
    /// Stored balance.
    pub current: Decimal,
    /// Net impact of the transaction.
    pub impact: Decimal,
    /// `current + impact`.
    pub projected: Decimal,
}

impl LimitProjection {
    /// Returns true if the projection is strictly above `limit`.
    #[must_use]
    pub fn exceeds(&self, limit: Decimal) -> bool {
        self.projected > limit
    }
}

/// Projects a balance snapshot forward by a transaction's impact.
#[must_use]
pub fn project_balance(current: Decimal, impact: Decimal) -> LimitProjection {
    LimitProjection {
        current,
        impact,
        projected: current + impact,
    }
}

/// Sum of the impacts of every entry of `transaction` on `account` at `layer`.
#[must_use]
pub fn transaction_impact(transaction: &GlTransaction, account: &Account, layer: Layer) -> Decimal {
    transaction
        .entries()
        .iter()
        .filter(|e| e.account.id == account.id && e.layer == layer)
        .map(|e| e.impact())
        .sum()
}

/// Rejects transactions that push an account over its daily or cumulative
/// limit.
///
/// Only non-bridge accounts are checked. A failed balance lookup rejects the
/// transaction too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    kind: LimitKind,
}

impl LimitRule {
    /// Daily limit rule.
    #[must_use]
    pub const fn daily() -> Self {
        Self {
            kind: LimitKind::Daily,
        }
    }

    /// Cumulative limit rule.
    #[must_use]
    pub const fn cumulative() -> Self {
        Self {
            kind: LimitKind::Cumulative,
        }
    }

    /// Limit enforced by this rule.
    #[must_use]
    pub const fn kind(&self) -> LimitKind {
        self.kind
    }

    fn check_account(
        &self,
        ctx: &RuleContext<'_>,
        account: &Account,
        target: Layer,
        limit: Decimal,
    ) -> Result<(), LedgerError> {
        let impact = transaction_impact(ctx.transaction, account, target);
        let current = match ctx
            .lookup
            .balance(ctx.transaction.journal, account, &[target])
        {
            Ok(balance) => balance,
            Err(err) => {
                error!(
                    rule = self.kind.rule_name(),
                    account = %account.code,
                    layer = %target,
                    error = %err,
                    "balance lookup failed, rejecting transaction"
                );
                return Err(LedgerError::LimitExceeded {
                    kind: self.kind,
                    account_code: account.code.clone(),
                    limit,
                    breach: LimitBreach::LookupFailed {
                        reason: err.to_string(),
                    },
                });
            }
        };

        let projection = project_balance(current, impact);
        if projection.exceeds(limit) {
            warn!(
                rule = self.kind.rule_name(),
                account = %account.code,
                layer = %target,
                %limit,
                current = %projection.current,
                impact = %projection.impact,
                projected = %projection.projected,
                "limit exceeded"
            );
            return Err(LedgerError::LimitExceeded {
                kind: self.kind,
                account_code: account.code.clone(),
                limit,
                breach: LimitBreach::Projected {
                    current: projection.current,
                    impact: projection.impact,
                    projected: projection.projected,
                },
            });
        }
        Ok(())
    }
}

impl JournalRule for LimitRule {
    fn name(&self) -> &str {
        self.kind.rule_name()
    }

    fn tag_keys(&self) -> Vec<TagKey> {
        vec![self.kind.tag_key()]
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), LedgerError> {
        let Some(limit) = ctx.tags.decimal(&self.kind.tag_key()) else {
            return Ok(());
        };

        let band = self.kind.layer_type();
        let mut checked = BTreeSet::new();
        for &offset in ctx.entry_offsets {
            let Some(entry) = ctx.transaction.entries().get(offset) else {
                continue;
            };
            if !entry.layer.is_in_band(band)
                || !ctx.layers.contains(&entry.layer)
                || !entry.account.is_final()
                || entry.account.is_bridge()
            {
                continue;
            }
            let target = Layer::of(band, entry.account.currency_id);
            if checked.insert((entry.account.id, target)) {
                self.check_account(ctx, &entry.account, target, limit)?;
            }
        }
        Ok(())
    }
}
