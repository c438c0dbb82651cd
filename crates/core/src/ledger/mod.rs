//! Double-entry ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Accounts, splits and transactions
//! - Account path resolution
//! - Point-in-time balances with roll-up and conversion
//! - Statement records and their classification
//! - Balanced trade transactions and price entries
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod builder;
pub mod error;
pub mod price;
pub mod record;
pub mod resolver;
pub mod split;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod builder_props;

pub use account::Account;
pub use balance::BalanceCalculator;
pub use builder::{HoldingSide, TradePlan, TransactionBuilder};
pub use error::{LedgerError, RecordField};
pub use price::{PriceRecorder, parse_price};
pub use record::{
    InvestmentRecord, PairedTrade, PlanRecords, PlanType, RecordClass, TradeKind, TradePair, TxRecord,
    parse_record_date,
};
pub use resolver::AccountResolver;
pub use split::{ReconcileState, Split, SplitAction};
pub use transaction::{Transaction, TransactionStatus};
pub use types::{Disposition, PRICE_SOURCE, Price, PriceType, TradeContext, TradeOutcome};
