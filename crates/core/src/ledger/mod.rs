//! Layered double-entry ledger.
//!
//! Every balance lives on a layer: a semantic band (base, pending, limits,
//! fees, ...) plus a currency id. A transaction is built in three stages:
//!
//! - a strategy turns each entry request into [`EntrySpec`]s,
//! - the [`EntrySpecExecutor`] materializes them as [`GlEntry`]s,
//! - the [`RuleEngine`] checks the result against balances read through
//!   [`BalanceLookup`].
//!
//! [`LedgerService`] wires the stages together for create, complete and
//! reverse.

pub mod account;
pub mod balance;
pub mod currency;
pub mod entry;
pub mod entry_spec;
pub mod error;
pub mod executor;
pub mod layer;
pub mod movement;
pub mod rules;
pub mod service;
pub mod strategy;
pub mod tags;
pub mod transaction;
pub mod types;
pub mod validation;

#[cfg(test)]
mod layer_props;
#[cfg(test)]
mod limit_props;
#[cfg(test)]
mod strategy_props;
#[cfg(test)]
mod tags_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountKind, AccountRef, AccountSide, BridgeRole, Chart};
pub use balance::{BalanceLookup, BalanceLookupError, InMemoryBalances};
pub use currency::CurrencyRegistry;
pub use entry::{EntryType, GlEntry};
pub use entry_spec::{EntryBuilder, EntrySpec, entry};
pub use error::{ErrorCategory, LedgerError, LimitBreach};
pub use executor::{EntrySpecExecutor, propagate_tags};
pub use layer::{BAND_WIDTH, CurrencyId, Layer, LayerType, is_in_band, layer_for};
pub use movement::MovementReport;
pub use rules::{DoubleEntry, JournalRule, LimitKind, LimitRule, RuleContext, RuleEngine, RuleEntry};
pub use service::LedgerService;
pub use strategy::{
    EntryBuilderPayload, EntryKind, EntryStrategy, StrategyFactory, TransactionContext,
    TransactionEntryRequest, TransactionGroup,
};
pub use tags::{TagKey, TagMap, TagValue, Tags};
pub use transaction::{GlTransaction, LayerTotals};
pub use types::{
    AmountBounds, CompletionOutcome, CreateTransactionRequest, GroupReversalOutcome, ReversalOutcome,
};
pub use validation::{LedgerValidationError, validate_entries};
