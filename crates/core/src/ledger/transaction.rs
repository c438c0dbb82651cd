//! Transaction aggregate.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{Commodity, TransactionId};

use super::split::Split;

/// Transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Transaction is being built and can be modified.
    Draft,
    /// Transaction has been committed to the book (immutable).
    Committed,
}

/// A financial transaction consisting of balanced splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, assigned at creation.
    pub id: TransactionId,
    /// Transaction date.
    pub date: NaiveDate,
    /// Currency all split values are expressed in.
    pub currency: Commodity,
    /// Transaction description.
    pub description: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Current status.
    pub status: TransactionStatus,
    /// Splits, in the order they were added.
    #[serde(default)]
    pub splits: Vec<Split>,
}

impl Transaction {
    /// Creates an editable draft transaction with no splits.
    #[must_use]
    pub fn draft(currency: Commodity, date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: TransactionId::new(),
            date,
            currency,
            description: description.into(),
            notes: String::new(),
            status: TransactionStatus::Draft,
            splits: Vec::new(),
        }
    }

    /// Returns true if the transaction can be edited.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.status == TransactionStatus::Draft
    }

    /// Appends a split, pointing its back-reference at this transaction.
    pub fn add_split(&mut self, mut split: Split) {
        split.transaction_id = self.id;
        self.splits.push(split);
    }

    /// Sum of all split values in the transaction currency.
    #[must_use]
    pub fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|s| s.value).sum()
    }

    /// Returns true if the split values net to exactly zero.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    /// Discards the draft, detaching its splits. Returns the number of splits dropped.
    pub fn rollback(mut self) -> usize {
        let detached = self.splits.len();
        self.splits.clear();
        tracing::debug!(transaction_id = %self.id, detached, "Draft transaction rolled back");
        detached
    }

    pub(crate) fn mark_committed(&mut self) {
        self.status = TransactionStatus::Committed;
    }
}
