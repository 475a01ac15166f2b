//! Accounts and charts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strata_shared::types::{AccountId, CurrencyCode};

use super::error::LedgerError;
use super::layer::CurrencyId;
use super::tags::Tags;

/// Normal balance side of an account.
///
/// - Debit side (assets, expenses): balance += debit - credit
/// - Credit side (liabilities, equity, revenue): balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSide {
    /// Debit-normal account.
    Debit,
    /// Credit-normal account.
    Credit,
}

impl AccountSide {
    /// Calculates the balance change for the given debit and credit amounts.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Role of a bridge account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeRole {
    /// Asset leg.
    Asset,
    /// Liability leg.
    Liability,
}

impl fmt::Display for BridgeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset => f.write_str("asset"),
            Self::Liability => f.write_str("liability"),
        }
    }
}

/// Kind of account in a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Leaf account holding balances.
    Final,
    /// Intermediate account that keeps transfers balanced.
    Bridge(BridgeRole),
    /// Folder account grouping others.
    Composite,
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Chart-unique code.
    pub code: String,
    /// Description.
    pub description: String,
    /// Currency of the balances.
    pub currency_code: CurrencyCode,
    /// Numeric currency id used to build layers.
    pub currency_id: CurrencyId,
    /// Normal balance side.
    pub side: AccountSide,
    /// Account kind.
    pub kind: AccountKind,
    /// Account tags, e.g. `type:EXPENSE`.
    pub tags: Tags,
}

/// Shared handle to an account.
pub type AccountRef = Arc<Account>;

impl Account {
    /// Creates a final account.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        side: AccountSide,
        currency_code: CurrencyCode,
        currency_id: CurrencyId,
    ) -> Self {
        let code = code.into();
        Self {
            id: AccountId::new(),
            description: code.clone(),
            code,
            currency_code,
            currency_id,
            side,
            kind: AccountKind::Final,
            tags: Tags::new(),
        }
    }

    /// Creates a bridge account. Asset bridges are debit side, liability
    /// bridges credit side.
    #[must_use]
    pub fn bridge(
        code: impl Into<String>,
        role: BridgeRole,
        currency_code: CurrencyCode,
        currency_id: CurrencyId,
    ) -> Self {
        let side = match role {
            BridgeRole::Asset => AccountSide::Debit,
            BridgeRole::Liability => AccountSide::Credit,
        };
        Self {
            kind: AccountKind::Bridge(role),
            ..Self::new(code, side, currency_code, currency_id)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Turns the account into a composite.
    #[must_use]
    pub fn composite(mut self) -> Self {
        self.kind = AccountKind::Composite;
        self
    }

    /// Returns true if the account holds balances.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self.kind, AccountKind::Final | AccountKind::Bridge(_))
    }

    /// Returns true for bridge accounts.
    #[must_use]
    pub const fn is_bridge(&self) -> bool {
        matches!(self.kind, AccountKind::Bridge(_))
    }

    /// Bridge role, if any.
    #[must_use]
    pub const fn bridge_role(&self) -> Option<BridgeRole> {
        match self.kind {
            AccountKind::Bridge(role) => Some(role),
            _ => None,
        }
    }

    /// Returns true if the account is tagged `type:EXPENSE`.
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.tags.get("type") == Some("EXPENSE")
    }
}

/// Accounts of one chart, indexed by code, plus bridges per currency.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    /// Chart code.
    pub code: String,
    accounts: BTreeMap<String, AccountRef>,
    bridges: BTreeMap<(CurrencyCode, BridgeRole), AccountRef>,
}

impl Chart {
    /// Creates an empty chart.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Adds an account and returns its shared handle. Bridge accounts also
    /// become the bridge for their currency and role.
    pub fn add_account(&mut self, account: Account) -> AccountRef {
        let account = Arc::new(account);
        if let Some(role) = account.bridge_role() {
            self.bridges
                .insert((account.currency_code.clone(), role), Arc::clone(&account));
        }
        self.accounts
            .insert(account.code.clone(), Arc::clone(&account));
        account
    }

    /// Adds an account, builder style.
    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        self.add_account(account);
        self
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn account(&self, code: &str) -> Option<&AccountRef> {
        self.accounts.get(code)
    }

    /// Looks up a balance-holding account by code.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] if the code is unknown or
    /// names a composite account.
    pub fn final_account(&self, code: &str) -> Result<AccountRef, LedgerError> {
        self.accounts
            .get(code)
            .filter(|a| a.is_final())
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }

    /// Bridge account for a currency and role.
    #[must_use]
    pub fn bridge(&self, currency: &CurrencyCode, role: BridgeRole) -> Option<&AccountRef> {
        self.bridges.get(&(currency.clone(), role))
    }

    /// Iterates over all accounts.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountRef> {
        self.accounts.values()
    }
}
