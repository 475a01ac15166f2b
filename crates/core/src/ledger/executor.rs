//! Turns entry specs into ledger entries.

use tracing::debug;

use super::entry::GlEntry;
use super::entry_spec::EntrySpec;
use super::error::LedgerError;
use super::tags::Tags;
use super::transaction::GlTransaction;
use super::validation::validate_specs;

/// Materializes [`EntrySpec`]s on a transaction, in list order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntrySpecExecutor;

impl EntrySpecExecutor {
    /// Appends one entry per spec and returns the new entries.
    ///
    /// The whole batch is validated before anything is appended, so a failed
    /// call leaves the transaction untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any spec has a zero or negative amount.
    pub fn execute_specs(
        transaction: &mut GlTransaction,
        specs: Vec<EntrySpec>,
    ) -> Result<&[GlEntry], LedgerError> {
        validate_specs(&specs)?;

        let start = transaction.entries().len();
        let count = specs.len();
        for spec in specs {
            let tags = propagate_tags(&transaction.tags, spec.tags.as_ref());
            transaction.push_entry(
                spec.account,
                spec.entry_type,
                spec.amount,
                spec.layer,
                spec.detail,
                tags,
            );
        }

        debug!(
            transaction = %transaction.detail,
            entries = count,
            "executed entry specs"
        );
        Ok(&transaction.entries()[start..])
    }

    /// Appends a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec has a zero or negative amount.
    pub fn execute_spec(
        transaction: &mut GlTransaction,
        spec: EntrySpec,
    ) -> Result<&GlEntry, LedgerError> {
        let entries = Self::execute_specs(transaction, vec![spec])?;
        entries
            .first()
            .ok_or_else(|| LedgerError::Internal("executed spec produced no entry".to_string()))
    }
}

/// Tags for an entry: the transaction's tags, followed by the spec's own tags
/// when it has any. Own values win key lookups.
#[must_use]
pub fn propagate_tags(transaction_tags: &Tags, spec_tags: Option<&Tags>) -> Tags {
    match spec_tags {
        Some(own) if transaction_tags.is_empty() => own.clone(),
        Some(own) => transaction_tags.merged_with(own),
        None => transaction_tags.clone(),
    }
}
