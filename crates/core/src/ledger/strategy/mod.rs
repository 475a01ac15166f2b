//! Entry strategies.
//!
//! A strategy decides which layers a transaction entry touches. Entries are
//! always built in three steps, in this order:
//!
//! 1. base layer entries (the economic movement),
//! 2. offset layer entries (pending, fee),
//! 3. limit entries (daily and cumulative usage).
//!
//! The set of strategies is closed, so [`EntryStrategy`] is an enum and every
//! step is a single `match`. [`StrategyFactory`] picks the first strategy that
//! can handle a [`TransactionContext`].

mod completion;
mod direct;
mod factory;
mod pending_bill_payment;
mod pending_inbound;

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use strata_shared::types::{CurrencyCode, Money};

use super::account::{AccountRef, BridgeRole, Chart};
use super::entry_spec::EntrySpec;
use super::error::LedgerError;
use super::layer::{CurrencyId, Layer, LayerType};
use super::transaction::GlTransaction;

pub use factory::StrategyFactory;

/// Kind of a transaction entry, from the entry's `type` metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// The principal amount.
    Amount,
    /// A fee.
    Fee,
    /// A commission paid out of an expense account.
    Commission,
    /// A rebate to the payer.
    Rebate,
    /// Any other value.
    Other(String),
}

impl EntryKind {
    /// Parses a metadata value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "AMOUNT" => Self::Amount,
            "FEE" => Self::Fee,
            "COMMISSION" => Self::Commission,
            "REBATE" => Self::Rebate,
            other => Self::Other(other.to_string()),
        }
    }

    /// Metadata value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Amount => "AMOUNT",
            Self::Fee => "FEE",
            Self::Commission => "COMMISSION",
            Self::Rebate => "REBATE",
            Self::Other(value) => value,
        }
    }
}

/// Business group of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionGroup {
    /// Person to person.
    P2p,
    /// Money coming in.
    Inbound,
    /// Money going out.
    Outbound,
    /// Bill payments.
    BillPayment,
    /// Any other group.
    Other(String),
}

impl TransactionGroup {
    /// Parses a group name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "P2P" => Self::P2p,
            "INBOUND" => Self::Inbound,
            "OUTBOUND" => Self::Outbound,
            "BILL_PAYMENT" => Self::BillPayment,
            other => Self::Other(other.to_string()),
        }
    }

    /// Group name as stored in tags.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::P2p => "P2P",
            Self::Inbound => "INBOUND",
            Self::Outbound => "OUTBOUND",
            Self::BillPayment => "BILL_PAYMENT",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for TransactionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One debit/credit pair requested by a caller.
#[derive(Debug, Clone)]
pub struct TransactionEntryRequest {
    /// Code of the account to debit.
    pub debit_account: String,
    /// Code of the account to credit.
    pub credit_account: String,
    /// Amount and currency.
    pub amount: Money,
    /// Line description.
    pub detail: String,
    /// Entry metadata: `type`, `skip_limits`, `fee_limit`.
    pub metadata: BTreeMap<String, String>,
}

impl TransactionEntryRequest {
    /// Creates a request without metadata.
    #[must_use]
    pub fn new(
        debit_account: impl Into<String>,
        credit_account: impl Into<String>,
        amount: Money,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            debit_account: debit_account.into(),
            credit_account: credit_account.into(),
            amount,
            detail: detail.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata value.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the entry kind.
    #[must_use]
    pub fn with_kind(self, kind: &EntryKind) -> Self {
        self.with_metadata("type", kind.as_str())
    }

    /// Entry kind, if the `type` metadata is set.
    #[must_use]
    pub fn kind(&self) -> Option<EntryKind> {
        self.metadata.get("type").map(|v| EntryKind::parse(v))
    }

    /// Returns true if `skip_limits` is `true` (any case).
    #[must_use]
    pub fn skip_limits(&self) -> bool {
        self.metadata
            .get("skip_limits")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Fee limit metadata.
    #[must_use]
    pub fn fee_limit(&self) -> Option<&str> {
        self.metadata.get("fee_limit").map(String::as_str)
    }
}

/// Shape of a transaction before entries are built.
#[derive(Debug, Clone)]
pub struct TransactionContext<'a> {
    /// Whether funds stay pending until completion.
    pub is_pending: bool,
    /// Chart the accounts belong to. Not known when completing.
    pub chart: Option<&'a Chart>,
    /// Currencies involved.
    pub currencies: BTreeMap<CurrencyCode, CurrencyId>,
    /// Accounts involved, by code.
    pub accounts: BTreeMap<String, AccountRef>,
    /// Bridge accounts available, by currency and role.
    pub bridge_accounts: BTreeMap<(CurrencyCode, BridgeRole), AccountRef>,
    /// Transaction group.
    pub group: TransactionGroup,
    /// Transaction type.
    pub transaction_type: String,
}

impl TransactionContext<'_> {
    /// Short description used in errors and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "pending={}, group={}, type={}",
            self.is_pending, self.group, self.transaction_type
        )
    }
}

/// Everything a strategy needs to build the entries of one request.
#[derive(Debug, Clone)]
pub struct EntryBuilderPayload<'a> {
    /// The request.
    pub entry: &'a TransactionEntryRequest,
    /// Currency of the request.
    pub currency: CurrencyId,
    /// Account to debit.
    pub debit_account: AccountRef,
    /// Account to credit.
    pub credit_account: AccountRef,
    /// Asset bridge for the debit account's currency.
    pub bridge_asset: Option<AccountRef>,
    /// Liability bridge for the debit account's currency.
    pub bridge_liability: Option<AccountRef>,
}

impl EntryBuilderPayload<'_> {
    /// Requested amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.entry.amount.amount
    }

    /// Requested detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.entry.detail
    }

    /// Bridge account for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingBridgeAccount`] if the chart has none.
    pub fn require_bridge(&self, role: BridgeRole) -> Result<AccountRef, LedgerError> {
        let bridge = match role {
            BridgeRole::Asset => self.bridge_asset.as_ref(),
            BridgeRole::Liability => self.bridge_liability.as_ref(),
        };
        bridge.cloned().ok_or_else(|| LedgerError::MissingBridgeAccount {
            role,
            currency: self.debit_account.currency_code.to_string(),
        })
    }
}

/// Base layer of a currency.
#[must_use]
pub fn base_layer(currency: CurrencyId) -> Layer {
    Layer::of(LayerType::Base, currency)
}

/// Pending layer of a currency.
#[must_use]
pub fn pending_layer(currency: CurrencyId) -> Layer {
    Layer::of(LayerType::Pending, currency)
}

/// Daily limit layer of a currency.
#[must_use]
pub fn daily_limit_layer(currency: CurrencyId) -> Layer {
    Layer::of(LayerType::DailyLimit, currency)
}

/// Cumulative limit layer of a currency.
#[must_use]
pub fn cumulative_limit_layer(currency: CurrencyId) -> Layer {
    Layer::of(LayerType::CumulativeLimit, currency)
}

/// Fee layer of a currency.
#[must_use]
pub fn fee_layer(currency: CurrencyId) -> Layer {
    Layer::of(LayerType::Fee, currency)
}

/// The entry strategies, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStrategy {
    /// Settles immediately on the base layer.
    Direct,
    /// Inbound funds held on the pending layer until completion.
    PendingInbound,
    /// Bill payment held on the pending layer until completion.
    PendingBillPayment,
}

impl EntryStrategy {
    /// Order in which the factory tries strategies.
    pub const REGISTRATION_ORDER: [Self; 3] =
        [Self::Direct, Self::PendingInbound, Self::PendingBillPayment];

    /// Strategy name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "DirectTransactionStrategy",
            Self::PendingInbound => "PendingInboundTransactionStrategy",
            Self::PendingBillPayment => "PendingBillPaymentTransactionStrategy",
        }
    }

    /// Returns true if the strategy handles this transaction shape.
    #[must_use]
    pub fn can_handle(self, context: &TransactionContext<'_>) -> bool {
        match self {
            Self::Direct => !context.is_pending,
            Self::PendingInbound => {
                context.is_pending && context.group == TransactionGroup::Inbound
            }
            Self::PendingBillPayment => {
                context.is_pending && context.group == TransactionGroup::BillPayment
            }
        }
    }

    /// Builds base, offset and limit entries, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if a required bridge account is missing or the
    /// request breaks a strategy-specific rule.
    pub fn create_entries(
        self,
        payload: &EntryBuilderPayload<'_>,
    ) -> Result<Vec<EntrySpec>, LedgerError> {
        let mut specs = self.base_layer_entries(payload)?;
        specs.extend(self.offset_layer_entries(payload)?);
        specs.extend(self.limit_entries(payload));
        Ok(specs)
    }

    fn base_layer_entries(
        self,
        payload: &EntryBuilderPayload<'_>,
    ) -> Result<Vec<EntrySpec>, LedgerError> {
        match self {
            Self::Direct => Ok(direct::base_layer_entries(payload)),
            Self::PendingInbound => pending_inbound::base_layer_entries(payload),
            Self::PendingBillPayment => pending_bill_payment::base_layer_entries(payload),
        }
    }

    fn offset_layer_entries(
        self,
        payload: &EntryBuilderPayload<'_>,
    ) -> Result<Vec<EntrySpec>, LedgerError> {
        match self {
            Self::Direct => Ok(direct::offset_layer_entries(payload)),
            Self::PendingInbound => pending_inbound::offset_layer_entries(payload),
            Self::PendingBillPayment => pending_bill_payment::offset_layer_entries(payload),
        }
    }

    fn limit_entries(self, payload: &EntryBuilderPayload<'_>) -> Vec<EntrySpec> {
        match self {
            Self::Direct => direct::limit_entries(payload),
            // pending funds are already visible on the pending layer
            Self::PendingInbound | Self::PendingBillPayment => Vec::new(),
        }
    }

    /// Adds to `completion` the entries that settle `original`.
    ///
    /// `currencies_layer` maps each currency code to its base layer. Nothing
    /// is appended unless every settling entry could be built.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPending`] for direct transactions, and an
    /// error if a tagged recipient or bridge cannot be resolved.
    pub fn complete_transaction(
        self,
        original: &GlTransaction,
        completion: &mut GlTransaction,
        currencies_layer: &BTreeMap<CurrencyCode, Layer>,
    ) -> Result<(), LedgerError> {
        let specs = match self {
            Self::Direct => return Err(LedgerError::NotPending(original.detail.clone())),
            Self::PendingInbound => {
                pending_inbound::completion_entries(original, currencies_layer)?
            }
            Self::PendingBillPayment => {
                pending_bill_payment::completion_entries(original, currencies_layer)?
            }
        };
        super::executor::EntrySpecExecutor::execute_specs(completion, specs)?;
        Ok(())
    }
}

impl fmt::Display for EntryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
