//! Shared types, errors, and configuration for Strata.
//!
//! This crate provides common types used across all other crates:
//! - Money and currency-code types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Ledger configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::LedgerConfig;
pub use error::AppError;
