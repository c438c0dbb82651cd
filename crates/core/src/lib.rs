//! Core ledger logic for Tally.
//!
//! This crate contains the ledger engine with ZERO web or database dependencies.
//! Books are reached only through the [`store::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `store` - Store abstraction and the in-memory book
//! - `ledger` - Account resolution, balances, records and balanced trades
//! - `reports` - Period aggregation of splits
//! - `session` - Locked sessions over a store
//! - `currency` - Rounding and exchange rates

pub mod currency;
pub mod ledger;
pub mod reports;
pub mod session;
pub mod store;
