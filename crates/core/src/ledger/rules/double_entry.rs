//! Per-layer balance rule.

use rust_decimal::Decimal;

use super::{JournalRule, RuleContext};
use crate::ledger::error::LedgerError;
use crate::ledger::validation::LedgerValidationError;

/// Rejects a transaction whose debits and credits differ on any of the
/// rule's layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleEntry;

impl JournalRule for DoubleEntry {
    fn name(&self) -> &str {
        "DoubleEntry"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), LedgerError> {
        for &layer in ctx.layers {
            let (debits, credits) = ctx
                .entry_offsets
                .iter()
                .filter_map(|&i| ctx.transaction.entries().get(i))
                .filter(|e| e.layer == layer)
                .fold((Decimal::ZERO, Decimal::ZERO), |(dr, cr), e| {
                    if e.is_debit() {
                        (dr + e.amount, cr)
                    } else {
                        (dr, cr + e.amount)
                    }
                });
            if debits != credits {
                return Err(LedgerValidationError::Unbalanced {
                    layer,
                    debits,
                    credits,
                }
                .into());
            }
        }
        Ok(())
    }
}
