//! Ledger domain types for price entries and trade construction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Commodity, PriceId};

use super::transaction::Transaction;

/// Source tag written on prices entered from statements.
pub const PRICE_SOURCE: &str = "user:price";

/// Kind of valuation a price records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    /// Net asset value per unit.
    Nav,
}

/// A commodity valuation on a given day.
///
/// Never mutated after it is committed to the price database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    /// Unique identifier.
    pub id: PriceId,
    /// The commodity being valued.
    pub commodity: Commodity,
    /// The currency of `value`.
    pub currency: Commodity,
    /// Day of the valuation.
    pub date: NaiveDate,
    /// Value of one unit of `commodity` in `currency`.
    pub value: Decimal,
    /// Where the price came from.
    pub source: String,
    /// Kind of valuation.
    pub kind: PriceType,
}

impl Price {
    /// Creates a draft net-asset-value price from a statement.
    #[must_use]
    pub fn nav(commodity: Commodity, currency: Commodity, date: NaiveDate, value: Decimal) -> Self {
        Self {
            id: PriceId::new(),
            commodity,
            currency,
            date,
            value,
            source: PRICE_SOURCE.to_string(),
            kind: PriceType::Nav,
        }
    }

    /// Returns true if this price occupies the same database slot as `other`.
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        self.commodity == other.commodity && self.currency == other.currency && self.date == other.date
    }
}

/// Accounts a trade is placed against, resolved from the record's plan and owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeContext {
    /// Parent of the per-fund asset accounts.
    pub asset_parent: AccountId,
    /// Revenue account for distributions and fees.
    pub revenue_account: AccountId,
}

/// What happened to a balanced transaction after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Committed to the book.
    Committed,
    /// Rolled back because the session is a dry run.
    Discarded,
}

/// Result of building a trade transaction.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// The transaction as built.
    pub transaction: Transaction,
    /// Whether it reached the book.
    pub disposition: Disposition,
}

impl TradeOutcome {
    /// Returns true if the transaction was committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.disposition == Disposition::Committed
    }
}
