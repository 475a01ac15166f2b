//! Journal rules.
//!
//! A rule inspects a transaction before it is handed back for persistence
//! and either allows it or returns a typed error. Rules are stateless; the
//! [`RuleEngine`] runs them in registration order and stops at the first
//! rejection.

mod double_entry;
mod engine;
mod limit;

use std::fmt;

use super::account::Account;
use super::balance::BalanceLookup;
use super::error::LedgerError;
use super::layer::Layer;
use super::tags::{TagKey, TagMap};
use super::transaction::GlTransaction;

pub use double_entry::DoubleEntry;
pub use engine::{RuleEngine, RuleEntry};
pub use limit::{LimitKind, LimitProjection, LimitRule, project_balance, transaction_impact};

/// Everything a rule sees during one check.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// Balance read model.
    pub lookup: &'a dyn BalanceLookup,
    /// Transaction under evaluation.
    pub transaction: &'a GlTransaction,
    /// The transaction's tags, parsed once.
    pub tags: &'a TagMap,
    /// Rule parameter from its registration.
    pub param: Option<&'a str>,
    /// Account the rule is scoped to, if any.
    pub account: Option<&'a Account>,
    /// Indices of the entries offered to the rule.
    pub entry_offsets: &'a [usize],
    /// Layers the rule applies to.
    pub layers: &'a [Layer],
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("transaction", &self.transaction.detail)
            .field("param", &self.param)
            .field("account", &self.account.map(|a| a.code.as_str()))
            .field("entry_offsets", &self.entry_offsets)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

/// A journal rule.
pub trait JournalRule: Send + Sync + fmt::Debug {
    /// Rule name for logs and errors.
    fn name(&self) -> &str;

    /// When false, rejections from this rule are logged and ignored.
    fn is_error_on_layer_mismatch(&self) -> bool {
        true
    }

    /// Tag keys whose values the rule reads. An unparseable value under one
    /// of these keys rejects the transaction.
    fn tag_keys(&self) -> Vec<TagKey> {
        Vec::new()
    }

    /// Checks the transaction.
    ///
    /// # Errors
    ///
    /// Returns the rejection, or any failure that prevented the check.
    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), LedgerError>;
}
