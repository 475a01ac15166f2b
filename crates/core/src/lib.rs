//! Core ledger logic for Strata.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Balances are read through the [`ledger::BalanceLookup`] trait and posted
//! transactions are handed back to the caller for persistence.
//!
//! # Modules
//!
//! - `ledger` - Layered double-entry bookkeeping: layers, tags, entry
//!   strategies, limit rules and the posting service

pub mod ledger;
