//! Transaction split domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, SplitId, TransactionId};

/// Action tag recorded on a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitAction {
    /// Units bought.
    Buy,
    /// Units sold.
    Sell,
    /// Fee charged against the holding.
    Fee,
    /// Distribution paid out or reinvested.
    Dist,
}

impl SplitAction {
    /// Buy for a positive unit amount, otherwise sell.
    #[must_use]
    pub fn from_units(units: Decimal) -> Self {
        if units > Decimal::ZERO { Self::Buy } else { Self::Sell }
    }
}

impl std::fmt::Display for SplitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
            Self::Fee => write!(f, "Fee"),
            Self::Dist => write!(f, "Dist"),
        }
    }
}

/// Reconciliation state of a split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    /// Not yet matched against a statement.
    #[default]
    NotReconciled,
    /// Cleared at creation.
    Cleared,
    /// Matched against a statement.
    Reconciled,
}

/// One leg of a transaction.
///
/// `value` is in the transaction currency, `amount` in the account's commodity.
/// Both are negative for a credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    /// Unique identifier for this split.
    pub id: SplitId,
    /// The transaction this split belongs to.
    pub transaction_id: TransactionId,
    /// The account affected by this split.
    pub account: AccountId,
    /// Signed value in the transaction currency.
    pub value: Decimal,
    /// Signed quantity in the account's commodity.
    pub amount: Decimal,
    /// Optional action tag.
    pub action: Option<SplitAction>,
    /// Optional memo.
    pub memo: Option<String>,
    /// Reconciliation state.
    #[serde(default)]
    pub reconcile: ReconcileState,
}

impl Split {
    /// Creates a split on `account`; it is attached to a transaction by
    /// [`Transaction::add_split`](super::Transaction::add_split).
    #[must_use]
    pub fn new(account: AccountId, value: Decimal, amount: Decimal) -> Self {
        Self {
            id: SplitId::new(),
            transaction_id: TransactionId::from_uuid(uuid::Uuid::nil()),
            account,
            value,
            amount,
            action: None,
            memo: None,
            reconcile: ReconcileState::NotReconciled,
        }
    }

    /// Creates a split in the transaction currency (amount equals value).
    #[must_use]
    pub fn currency_leg(account: AccountId, value: Decimal) -> Self {
        Self::new(account, value, value)
    }

    /// Sets the action tag.
    #[must_use]
    pub fn with_action(mut self, action: SplitAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Sets the reconciliation state.
    #[must_use]
    pub fn with_reconcile(mut self, reconcile: ReconcileState) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Returns true if this split is a credit.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.value < Decimal::ZERO
    }
}
