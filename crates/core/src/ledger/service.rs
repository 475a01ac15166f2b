//! Ledger service for creating, completing and reversing transactions.
//!
//! The service holds no state between calls. It returns transactions for the
//! caller to persist inside its own database transaction; any error means
//! nothing should be persisted.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use strata_shared::LedgerConfig;
use strata_shared::types::{CurrencyCode, JournalId};
use tracing::{info, warn};
use uuid::Uuid;

use super::account::{Account, AccountRef, AccountSide, BridgeRole, Chart};
use super::balance::BalanceLookup;
use super::currency::CurrencyRegistry;
use super::entry::EntryType;
use super::entry_spec::EntrySpec;
use super::error::LedgerError;
use super::executor::EntrySpecExecutor;
use super::layer::{CurrencyId, Layer, LayerType};
use super::movement::MovementReport;
use super::rules::RuleEngine;
use super::strategy::{
    EntryBuilderPayload, EntryKind, StrategyFactory, TransactionContext, TransactionEntryRequest,
    TransactionGroup,
};
use super::tags::Tags;
use super::transaction::GlTransaction;
use super::types::{
    AmountBounds, CompletionOutcome, CreateTransactionRequest, GroupReversalOutcome,
    ReversalOutcome,
};
use super::validation::{LedgerValidationError, validate_entries};

/// Posting service.
#[derive(Debug, Clone)]
pub struct LedgerService {
    registry: CurrencyRegistry,
    factory: StrategyFactory,
    rules: RuleEngine,
    default_journal: Option<JournalId>,
    log_movements: bool,
}

impl LedgerService {
    /// Service with the standard rules and strict strategy selection.
    #[must_use]
    pub fn new(registry: CurrencyRegistry) -> Self {
        Self {
            rules: RuleEngine::standard(&registry),
            factory: StrategyFactory::new(),
            registry,
            default_journal: None,
            log_movements: false,
        }
    }

    /// Service configured from [`LedgerConfig`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the currencies are invalid.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let registry = CurrencyRegistry::from_config(config)?;
        Ok(Self {
            factory: StrategyFactory::from_config(config),
            default_journal: config.journal.map(JournalId::from_uuid),
            log_movements: config.movements.log,
            ..Self::new(registry)
        })
    }

    /// Replaces the rule engine.
    #[must_use]
    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the strategy factory.
    #[must_use]
    pub fn with_factory(mut self, factory: StrategyFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Journal used when a request names none.
    #[must_use]
    pub const fn with_default_journal(mut self, journal: JournalId) -> Self {
        self.default_journal = Some(journal);
        self
    }

    /// Enables movement reports.
    #[must_use]
    pub const fn with_movement_log(mut self, enabled: bool) -> Self {
        self.log_movements = enabled;
        self
    }

    /// Configured currencies.
    #[must_use]
    pub const fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    /// Builds, validates and rule-checks a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, no strategy handles it,
    /// the entries do not balance or a rule rejects the transaction.
    pub fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
        chart: &Chart,
        lookup: &dyn BalanceLookup,
    ) -> Result<GlTransaction, LedgerError> {
        if request.entries.is_empty() {
            return Err(LedgerValidationError::NoEntries.into());
        }

        let context = self.build_context(request, chart)?;
        for entry in &request.entries {
            validate_entry(entry, &context, request.limits)?;
        }

        let journal = request
            .journal
            .or(self.default_journal)
            .ok_or_else(|| LedgerError::MissingJournal(request.reference.clone()))?;
        let tags: Tags = request
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        let mut transaction = GlTransaction::new(journal, &request.reference, tags);

        for entry in &request.entries {
            let strategy = self.factory.get_strategy_for_entry(entry, &context)?;
            let payload = self.payload(entry, &context)?;
            let specs = strategy.create_entries(&payload)?;
            EntrySpecExecutor::execute_specs(&mut transaction, specs)?;
        }
        transaction.tags.add(format!("group:{}", request.group));
        transaction
            .tags
            .add(format!("type:{}", request.transaction_type));

        validate_entries(transaction.entries())?;
        self.rules.evaluate(&transaction, lookup)?;
        self.report(&transaction, "create");

        info!(
            transaction = %transaction.detail,
            journal = %transaction.journal,
            entries = transaction.entries().len(),
            pending = request.pending,
            "transaction created"
        );
        Ok(transaction)
    }

    /// Settles a pending transaction.
    ///
    /// On success the original is tagged `completed:true`; completing it again
    /// returns [`CompletionOutcome::AlreadyCompleted`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPending`] for direct transactions, an error if
    /// the original lacks its `group` or `type` tag, or any error from the
    /// strategy, validation or rules. The original is untouched on error.
    pub fn complete_transaction(
        &self,
        original: &mut GlTransaction,
        lookup: &dyn BalanceLookup,
    ) -> Result<CompletionOutcome, LedgerError> {
        if original.is_completed() {
            info!(transaction = %original.detail, "transaction already completed");
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let mut currencies = BTreeMap::new();
        let mut currencies_layer: BTreeMap<CurrencyCode, Layer> = BTreeMap::new();
        for entry in original.entries() {
            let code = &entry.account.currency_code;
            let id = self.registered_currency(&entry.account)?;
            currencies.insert(code.clone(), id);
            currencies_layer.insert(code.clone(), Layer::of(LayerType::Base, id));
        }

        let group = required_tag(original, "group")?;
        let transaction_type = required_tag(original, "type")?;
        let context = TransactionContext {
            is_pending: original.touches_band(LayerType::Pending),
            chart: None,
            currencies,
            accounts: original
                .entries()
                .iter()
                .map(|e| (e.account.code.clone(), AccountRef::clone(&e.account)))
                .collect(),
            bridge_accounts: original
                .entries()
                .iter()
                .filter_map(|e| {
                    e.account.bridge_role().map(|role| {
                        (
                            (e.account.currency_code.clone(), role),
                            AccountRef::clone(&e.account),
                        )
                    })
                })
                .collect(),
            group: TransactionGroup::parse(&group),
            transaction_type,
        };
        let strategy = self.factory.get_strategy(&context)?;

        let tags = original
            .tags
            .clone()
            .with(format!("completes:{}", original.detail));
        let mut completion = GlTransaction::new(original.journal, Uuid::now_v7().to_string(), tags);
        strategy.complete_transaction(original, &mut completion, &currencies_layer)?;

        validate_entries(completion.entries())?;
        self.rules.evaluate(&completion, lookup)?;
        self.report(&completion, "complete");

        original.tags.add("completed:true");
        info!(
            transaction = %original.detail,
            completion = %completion.detail,
            strategy = %strategy,
            "transaction completed"
        );
        Ok(CompletionOutcome::Completed(completion))
    }

    /// Mirrors every entry of `original`.
    ///
    /// On success the original is tagged `reversed:true`; reversing it again
    /// returns [`ReversalOutcome::AlreadyReversed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the reversal does not balance or a rule rejects it.
    /// The original is untouched on error.
    pub fn reverse_transaction(
        &self,
        original: &mut GlTransaction,
        reversal_reference: &str,
        lookup: &dyn BalanceLookup,
    ) -> Result<ReversalOutcome, LedgerError> {
        if original.is_reversed() {
            info!(transaction = %original.detail, "transaction already reversed");
            return Ok(ReversalOutcome::AlreadyReversed);
        }

        let reversal = original.create_reverse(reversal_reference);
        validate_entries(reversal.entries())?;
        self.rules.evaluate(&reversal, lookup)?;
        self.report(&reversal, "reverse");

        original.tags.add("reversed:true");
        info!(
            transaction = %original.detail,
            reversal = %reversal.detail,
            "transaction reversed"
        );
        Ok(ReversalOutcome::Reversed(reversal))
    }

    /// Reverses every transaction posted under one reference, newest
    /// `post_date` first.
    ///
    /// Reversing a group whose members are all tagged `reversed:true`
    /// returns [`GroupReversalOutcome::AlreadyReversed`]. On success every
    /// member is tagged `reversed:true` and `group` is left sorted newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::GroupNotFound`] for an empty group,
    /// [`LedgerError::PartiallyReversedGroup`] if only some members were
    /// reversed, or any error from validation or rules. No member is tagged
    /// on error.
    pub fn reverse_group(
        &self,
        reference: &str,
        group: &mut [GlTransaction],
        lookup: &dyn BalanceLookup,
    ) -> Result<GroupReversalOutcome, LedgerError> {
        if group.is_empty() {
            return Err(LedgerError::GroupNotFound(reference.to_string()));
        }

        let reversed = group.iter().filter(|t| t.is_reversed()).count();
        if reversed == group.len() {
            info!(reference, members = group.len(), "transaction group already reversed");
            return Ok(GroupReversalOutcome::AlreadyReversed);
        }
        if reversed > 0 {
            warn!(reference, reversed, total = group.len(), "transaction group partially reversed");
            return Err(LedgerError::PartiallyReversedGroup {
                reference: reference.to_string(),
                reversed,
                total: group.len(),
            });
        }

        group.sort_by(|a, b| b.post_date.cmp(&a.post_date));
        let mut reversals = Vec::with_capacity(group.len());
        for original in group.iter() {
            let reversal = original.create_reverse(Uuid::now_v7().to_string());
            validate_entries(reversal.entries())?;
            self.rules.evaluate(&reversal, lookup)?;
            reversals.push(reversal);
        }

        for (original, reversal) in group.iter_mut().zip(&reversals) {
            self.report(reversal, "reverse-group");
            original.tags.add("reversed:true");
        }
        info!(reference, members = reversals.len(), "transaction group reversed");
        Ok(GroupReversalOutcome::Reversed(reversals))
    }

    /// Nets the daily limit usage of every balance-holding account in
    /// `chart` back to zero against its currency's asset bridge.
    ///
    /// Returns `None` when no account has usage. The transaction is tagged
    /// `type:DAILY_LIMIT_RESET` and is for the caller to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if a balance cannot be read, an account's currency
    /// is not registered or has no asset bridge, or the entries do not
    /// balance.
    pub fn daily_limit_reset(
        &self,
        journal: JournalId,
        chart: &Chart,
        lookup: &dyn BalanceLookup,
    ) -> Result<Option<GlTransaction>, LedgerError> {
        let mut specs = Vec::new();
        for account in chart.accounts().filter(|a| a.is_final() && !a.is_bridge()) {
            let layer = Layer::of(LayerType::DailyLimit, self.registered_currency(account)?);
            let usage = lookup
                .balance(journal, account, &[layer])
                .map_err(|source| LedgerError::BalanceUnavailable {
                    account: account.code.clone(),
                    source,
                })?;
            if usage.is_zero() {
                continue;
            }

            let bridge = chart
                .bridge(&account.currency_code, BridgeRole::Asset)
                .ok_or_else(|| LedgerError::MissingBridgeAccount {
                    role: BridgeRole::Asset,
                    currency: account.currency_code.to_string(),
                })?;
            let direction = reset_direction(account.side, usage);
            let amount = usage.abs();
            specs.push(EntrySpec::new(
                AccountRef::clone(account),
                amount,
                direction,
                layer,
                "daily_limit_reset",
            ));
            specs.push(EntrySpec::new(
                AccountRef::clone(bridge),
                amount,
                direction.opposite(),
                layer,
                "daily_limit_reset",
            ));
        }

        if specs.is_empty() {
            info!(journal = %journal, "no daily limit usage to reset");
            return Ok(None);
        }

        let tags = Tags::new().with("type:DAILY_LIMIT_RESET");
        let mut reset = GlTransaction::new(journal, Uuid::now_v7().to_string(), tags);
        EntrySpecExecutor::execute_specs(&mut reset, specs)?;
        validate_entries(reset.entries())?;
        self.report(&reset, "daily-limit-reset");

        info!(
            journal = %journal,
            transaction = %reset.detail,
            accounts = reset.entries().len() / 2,
            "daily limits reset"
        );
        Ok(Some(reset))
    }

    /// Registry id for the account's currency. Fails when the account was
    /// built with a different id.
    fn registered_currency(&self, account: &Account) -> Result<CurrencyId, LedgerError> {
        let registered = self.registry.id_of(&account.currency_code)?;
        if registered != account.currency_id {
            return Err(LedgerError::CurrencyIdMismatch {
                account: account.code.clone(),
                configured: account.currency_id.get(),
                registered: registered.get(),
            });
        }
        Ok(registered)
    }

    fn build_context<'a>(
        &self,
        request: &CreateTransactionRequest,
        chart: &'a Chart,
    ) -> Result<TransactionContext<'a>, LedgerError> {
        let mut currencies = BTreeMap::new();
        let mut accounts = BTreeMap::new();
        let mut bridge_accounts = BTreeMap::new();

        for entry in &request.entries {
            for code in [&entry.debit_account, &entry.credit_account] {
                let account = chart.final_account(code)?;
                self.registered_currency(&account)?;
                accounts.insert(code.clone(), account);
            }
            let currency = &entry.amount.currency;
            currencies.insert(currency.clone(), self.registry.id_of(currency)?);
            for role in [BridgeRole::Asset, BridgeRole::Liability] {
                if let Some(bridge) = chart.bridge(currency, role) {
                    self.registered_currency(bridge)?;
                    bridge_accounts.insert((currency.clone(), role), AccountRef::clone(bridge));
                }
            }
        }

        Ok(TransactionContext {
            is_pending: request.pending,
            chart: Some(chart),
            currencies,
            accounts,
            bridge_accounts,
            group: request.group.clone(),
            transaction_type: request.transaction_type.clone(),
        })
    }

    fn payload<'a>(
        &self,
        entry: &'a TransactionEntryRequest,
        context: &TransactionContext<'_>,
    ) -> Result<EntryBuilderPayload<'a>, LedgerError> {
        let account = |code: &str| {
            context
                .accounts
                .get(code)
                .cloned()
                .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
        };
        let debit_account = account(&entry.debit_account)?;
        let credit_account = account(&entry.credit_account)?;
        let currency = self.registry.id_of(&debit_account.currency_code)?;
        let bridge = |role| {
            context
                .bridge_accounts
                .get(&(debit_account.currency_code.clone(), role))
                .cloned()
        };

        Ok(EntryBuilderPayload {
            entry,
            currency,
            bridge_asset: bridge(BridgeRole::Asset),
            bridge_liability: bridge(BridgeRole::Liability),
            debit_account,
            credit_account,
        })
    }

    fn report(&self, transaction: &GlTransaction, label: &str) {
        if self.log_movements {
            MovementReport::from_transaction(transaction, label).log();
        }
    }
}

/// Direction of the entry that moves `usage` on an account of `side` back
/// to zero.
fn reset_direction(side: AccountSide, usage: Decimal) -> EntryType {
    if (side == AccountSide::Credit) == usage.is_sign_positive() {
        EntryType::Debit
    } else {
        EntryType::Credit
    }
}

fn required_tag(transaction: &GlTransaction, key: &'static str) -> Result<String, LedgerError> {
    transaction
        .tags
        .get(key)
        .map(ToString::to_string)
        .ok_or_else(|| LedgerError::MissingTransactionTag {
            key,
            transaction: transaction.detail.clone(),
        })
}

/// Checks one entry request against the accounts of the context.
fn validate_entry(
    entry: &TransactionEntryRequest,
    context: &TransactionContext<'_>,
    bounds: Option<AmountBounds>,
) -> Result<(), LedgerError> {
    let amount = entry.amount.amount;
    if amount <= Decimal::ZERO {
        return Err(LedgerValidationError::InvalidAmount {
            account: entry.debit_account.clone(),
            amount,
        }
        .into());
    }

    for code in [&entry.debit_account, &entry.credit_account] {
        let account = context
            .accounts
            .get(code.as_str())
            .ok_or_else(|| LedgerError::AccountNotFound(code.clone()))?;
        if account.currency_code != entry.amount.currency {
            return Err(LedgerError::CurrencyMismatch {
                account: code.clone(),
                expected: entry.amount.currency.to_string(),
                actual: account.currency_code.to_string(),
            });
        }
    }

    if let Some(bounds) = bounds
        && entry.kind() == Some(EntryKind::Amount)
        && !entry.skip_limits()
        && !bounds.contains(amount)
    {
        return Err(LedgerError::TransactionAmountOutOfBounds {
            amount,
            min: bounds.min,
            max: bounds.max,
        });
    }
    Ok(())
}
