//! Ledger error types.
//!
//! Every ledger operation returns [`LedgerError`]. Errors fall into four
//! categories: configuration problems that no request can fix, validation
//! failures in a request, rejections by a journal rule, and internal errors.

use rust_decimal::Decimal;
use strata_shared::AppError;
use thiserror::Error;

use super::account::BridgeRole;
use super::balance::BalanceLookupError;
use super::layer::Layer;
use super::rules::LimitKind;
use super::validation::LedgerValidationError;

/// Broad classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Misconfigured ledger: strategies, currencies, tags or bridges.
    Configuration,
    /// The request or transaction is structurally invalid.
    Validation,
    /// A journal rule rejected the transaction.
    Rejection,
    /// Unexpected failure inside the core.
    Internal,
}

/// What pushed a transaction over its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitBreach {
    /// The projected balance is above the limit.
    Projected {
        /// Balance on the limit layer before this transaction.
        current: Decimal,
        /// Net impact of this transaction on the limit layer.
        impact: Decimal,
        /// `current + impact`.
        projected: Decimal,
    },
    /// The balance could not be read, so the check failed closed.
    LookupFailed {
        /// Why the lookup failed.
        reason: String,
    },
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Configuration Errors ==========
    /// No entry strategy accepts the transaction.
    #[error("No entry strategy found for {context}")]
    NoStrategy {
        /// Description of the unmatched context.
        context: String,
    },

    /// A limit tag is present but its value is not a decimal.
    #[error("Invalid {key} value: {value:?}")]
    InvalidLimitTag {
        /// Tag key.
        key: String,
        /// Raw tag value.
        value: String,
    },

    /// Currency id does not fit inside a layer band.
    #[error("Currency id {currency_id} overflows the layer band width")]
    BandOverflow {
        /// Offending currency id.
        currency_id: u16,
    },

    /// Currency code or id configured twice.
    #[error("Duplicate currency: {0}")]
    DuplicateCurrency(String),

    /// Currency is not configured.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Chart has no bridge account for the role and currency.
    #[error("Bridge {role} account not found for currency {currency}")]
    MissingBridgeAccount {
        /// Bridge role.
        role: BridgeRole,
        /// Currency code.
        currency: String,
    },

    /// No journal given and no default configured.
    #[error("No journal given for transaction {0}")]
    MissingJournal(String),

    /// Chart account carries a currency id the registry does not assign to its code.
    #[error(
        "Account {account} uses currency id {configured}, but the registry assigns {registered}"
    )]
    CurrencyIdMismatch {
        /// Account code.
        account: String,
        /// Id stored on the account.
        configured: u16,
        /// Id the registry holds for the account's currency.
        registered: u16,
    },

    // ========== Validation Errors ==========
    /// Structural problem with a set of entries.
    #[error(transparent)]
    Validation(#[from] LedgerValidationError),

    /// Account not found in the chart.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Entry accounts and amount disagree on currency.
    #[error("Currency mismatch for account {account}: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Account code.
        account: String,
        /// Currency of the amount.
        expected: String,
        /// Currency of the account.
        actual: String,
    },

    /// Amount outside the per-transaction bounds.
    #[error("Transaction amount {amount} outside allowed range [{min}, {max}]")]
    TransactionAmountOutOfBounds {
        /// Requested amount.
        amount: Decimal,
        /// Lower bound.
        min: Decimal,
        /// Upper bound.
        max: Decimal,
    },

    /// Commission debited from an account not tagged `type:EXPENSE`.
    #[error("Commission must be debited from an expense account, got {0}")]
    NonExpenseCommissionAccount(String),

    /// Transaction lacks a tag needed to process it.
    #[error("Transaction {transaction} has no {key} tag")]
    MissingTransactionTag {
        /// Missing tag key.
        key: &'static str,
        /// Transaction detail.
        transaction: String,
    },

    /// Tagged recipient does not appear in the transaction.
    #[error("Recipient account {0} not found in transaction")]
    RecipientNotFound(String),

    /// Only pending transactions can be completed.
    #[error("Transaction {0} is not pending")]
    NotPending(String),

    /// No transactions share the reference.
    #[error("Transaction group {0} not found")]
    GroupNotFound(String),

    /// Some but not all members of a group are already reversed.
    #[error("Transaction group {reference} is partially reversed ({reversed} of {total})")]
    PartiallyReversedGroup {
        /// Shared reference.
        reference: String,
        /// Members already tagged `reversed:true`.
        reversed: usize,
        /// Group size.
        total: usize,
    },

    // ========== Rule Rejections ==========
    /// A limit rule rejected the transaction.
    #[error("{kind} limit of {limit} exceeded for account {account_code}: {breach}")]
    LimitExceeded {
        /// Which limit.
        kind: LimitKind,
        /// Account that breached.
        account_code: String,
        /// Configured limit.
        limit: Decimal,
        /// Diagnostics.
        breach: LimitBreach,
    },

    /// A rule failed unexpectedly and the transaction was rejected.
    #[error("Rule {rule} failed: {source}")]
    RuleFailed {
        /// Rule name.
        rule: String,
        /// Underlying failure.
        source: Box<LedgerError>,
    },

    // ========== Internal Errors ==========
    /// A balance the operation depends on could not be read.
    #[error("Balance of account {account} unavailable: {source}")]
    BalanceUnavailable {
        /// Account code.
        account: String,
        /// Lookup failure.
        source: BalanceLookupError,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl std::fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projected {
                current,
                impact,
                projected,
            } => write!(
                f,
                "current balance {current}, transaction impact {impact}, projected balance {projected}"
            ),
            Self::LookupFailed { reason } => write!(f, "balance lookup failed: {reason}"),
        }
    }
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoStrategy { .. } => "NO_STRATEGY",
            Self::InvalidLimitTag { .. } => "INVALID_LIMIT_TAG",
            Self::BandOverflow { .. } => "LAYER_BAND_OVERFLOW",
            Self::DuplicateCurrency(_) => "DUPLICATE_CURRENCY",
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::MissingBridgeAccount { .. } => "MISSING_BRIDGE_ACCOUNT",
            Self::MissingJournal(_) => "MISSING_JOURNAL",
            Self::CurrencyIdMismatch { .. } => "CURRENCY_ID_MISMATCH",
            Self::Validation(LedgerValidationError::NoEntries) => "NO_ENTRIES",
            Self::Validation(LedgerValidationError::InvalidAmount { .. }) => "INVALID_AMOUNT",
            Self::Validation(LedgerValidationError::Unbalanced { .. }) => "UNBALANCED_TRANSACTION",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::TransactionAmountOutOfBounds { .. } => "TRANSACTION_AMOUNT_OUT_OF_BOUNDS",
            Self::NonExpenseCommissionAccount(_) => "NON_EXPENSE_COMMISSION_ACCOUNT",
            Self::MissingTransactionTag { .. } => "MISSING_TRANSACTION_TAG",
            Self::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            Self::NotPending(_) => "NOT_PENDING",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::PartiallyReversedGroup { .. } => "PARTIALLY_REVERSED_GROUP",
            Self::LimitExceeded { .. } => "TRANSACTION_LIMIT_EXCEEDED",
            Self::RuleFailed { .. } => "RULE_FAILED",
            Self::BalanceUnavailable { .. } => "BALANCE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoStrategy { .. }
            | Self::InvalidLimitTag { .. }
            | Self::BandOverflow { .. }
            | Self::DuplicateCurrency(_)
            | Self::UnknownCurrency(_)
            | Self::MissingBridgeAccount { .. }
            | Self::MissingJournal(_)
            | Self::CurrencyIdMismatch { .. } => ErrorCategory::Configuration,

            Self::Validation(_)
            | Self::AccountNotFound(_)
            | Self::CurrencyMismatch { .. }
            | Self::TransactionAmountOutOfBounds { .. }
            | Self::NonExpenseCommissionAccount(_)
            | Self::MissingTransactionTag { .. }
            | Self::RecipientNotFound(_)
            | Self::NotPending(_)
            | Self::GroupNotFound(_)
            | Self::PartiallyReversedGroup { .. } => ErrorCategory::Validation,

            Self::LimitExceeded { .. } | Self::RuleFailed { .. } => ErrorCategory::Rejection,

            Self::BalanceUnavailable { .. } | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if the failure came from outside the ledger core rather
    /// than from the transaction.
    #[must_use]
    pub fn is_infrastructure_failure(&self) -> bool {
        matches!(
            self,
            Self::LimitExceeded {
                breach: LimitBreach::LookupFailed { .. },
                ..
            } | Self::RuleFailed { .. }
                | Self::BalanceUnavailable { .. }
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match (&err, err.category()) {
            (
                LedgerError::AccountNotFound(_)
                | LedgerError::RecipientNotFound(_)
                | LedgerError::GroupNotFound(_),
                _,
            ) => {
                Self::NotFound(message)
            }
            (_, ErrorCategory::Configuration) => Self::Configuration(message),
            (_, ErrorCategory::Validation) => Self::Validation(message),
            (_, ErrorCategory::Rejection) => Self::BusinessRule(message),
            (_, ErrorCategory::Internal) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn projected_breach() -> LedgerError {
        LedgerError::LimitExceeded {
            kind: LimitKind::Daily,
            account_code: "wallet-1".to_string(),
            limit: dec!(1000.00),
            breach: LimitBreach::Projected {
                current: dec!(900.00),
                impact: dec!(150.00),
                projected: dec!(1050.00),
            },
        }
    }

    fn lookup_breach() -> LedgerError {
        LedgerError::LimitExceeded {
            kind: LimitKind::Cumulative,
            account_code: "wallet-1".to_string(),
            limit: dec!(1000.00),
            breach: LimitBreach::LookupFailed {
                reason: "connection reset".to_string(),
            },
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::NoStrategy {
                context: String::new()
            }
            .error_code(),
            "NO_STRATEGY"
        );
        assert_eq!(
            LedgerError::from(LedgerValidationError::NoEntries).error_code(),
            "NO_ENTRIES"
        );
        assert_eq!(projected_breach().error_code(), "TRANSACTION_LIMIT_EXCEEDED");
        assert_eq!(lookup_breach().error_code(), "TRANSACTION_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            LedgerError::BandOverflow { currency_id: 1000 }.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LedgerError::InvalidLimitTag {
                key: "daily_limit".into(),
                value: "abc".into()
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LedgerError::AccountNotFound("x".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(projected_breach().category(), ErrorCategory::Rejection);
        assert_eq!(lookup_breach().category(), ErrorCategory::Rejection);
        assert_eq!(
            LedgerError::Internal("boom".into()).category(),
            ErrorCategory::Internal
        );
        assert_eq!(
            LedgerError::PartiallyReversedGroup {
                reference: "ref".into(),
                reversed: 1,
                total: 2,
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            LedgerError::BalanceUnavailable {
                account: "wallet-1".into(),
                source: BalanceLookupError::Unavailable("db down".into()),
            }
            .category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_infrastructure_failure_flag() {
        assert!(!projected_breach().is_infrastructure_failure());
        assert!(lookup_breach().is_infrastructure_failure());
        assert!(
            LedgerError::RuleFailed {
                rule: "DoubleEntry".into(),
                source: Box::new(LedgerError::Internal("boom".into())),
            }
            .is_infrastructure_failure()
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            projected_breach().to_string(),
            "Daily limit of 1000.00 exceeded for account wallet-1: current balance 900.00, \
             transaction impact 150.00, projected balance 1050.00"
        );
        assert_eq!(
            lookup_breach().to_string(),
            "Cumulative limit of 1000.00 exceeded for account wallet-1: balance lookup failed: \
             connection reset"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = projected_breach().into();
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = LedgerError::AccountNotFound("x".into()).into();
        assert_eq!(app.error_code(), "NOT_FOUND");

        let app: AppError = LedgerError::UnknownCurrency("XYZ".into()).into();
        assert_eq!(app.error_code(), "CONFIGURATION_ERROR");

        let app: AppError = LedgerError::NotPending("ref".into()).into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = LedgerError::GroupNotFound("ref".into()).into();
        assert_eq!(app.error_code(), "NOT_FOUND");

        let app: AppError = LedgerError::CurrencyIdMismatch {
            account: "wallet-1".into(),
            configured: 1,
            registered: 2,
        }
        .into();
        assert_eq!(app.error_code(), "CONFIGURATION_ERROR");
    }
}
