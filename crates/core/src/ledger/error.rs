//! Ledger error types for resolution, balancing, records and locking.
//!
//! This module defines all errors that can occur during ledger operations:
//! account path resolution, the zero-sum check, source record validation,
//! exact decimal construction, and store locking.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tally_shared::types::Commodity;

use crate::store::StoreError;

/// Which token of a source record was not recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    /// Plan type (OPEN, TFSA, RRSP).
    Plan,
    /// Plan owner.
    Owner,
    /// Account type (asset or revenue).
    AccountType,
    /// Trade transaction type.
    TradeKind,
    /// Statement date.
    Date,
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::Owner => write!(f, "owner"),
            Self::AccountType => write!(f, "account type"),
            Self::TradeKind => write!(f, "trade type"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Account Errors ==========
    /// A path segment has no matching child account.
    #[error("Path {path:?} could not be found (last searched: '{searched}')")]
    AccountNotFound {
        /// The full path being resolved.
        path: Vec<String>,
        /// Name of the last account searched.
        searched: String,
    },

    /// An account path must have at least one segment.
    #[error("Account path is empty")]
    EmptyAccountPath,

    // ========== Balance Errors ==========
    /// Split values do not net to zero.
    #[error("Transaction imbalance of {residual} {currency}")]
    Imbalance {
        /// Sum of split values.
        residual: Decimal,
        /// Transaction currency.
        currency: Commodity,
    },

    // ========== Record Errors ==========
    /// A source record carries an unrecognised token.
    #[error("Invalid {field}: '{token}'")]
    InvalidRecordType {
        /// The offending field.
        field: RecordField,
        /// The offending token.
        token: String,
    },

    /// A paired trade arrived without its counterpart.
    #[error("Paired trade '{0}' has no counterpart record")]
    MissingCounterpart(String),

    /// A quantity cannot be represented as an exact decimal.
    #[error("Cannot represent {0} as an exact decimal")]
    Precision(String),

    // ========== Lock Errors ==========
    /// The store is already open in another session.
    #[error("Store '{0}' is locked by another session")]
    LockUnavailable(String),

    /// The store lock was not released within the wait bound.
    #[error("Timed out after {waited:?} waiting for store '{store}'")]
    LockTimeout {
        /// Store identity.
        store: String,
        /// How long the caller waited.
        waited: Duration,
    },

    // ========== Store Errors ==========
    /// Error raised by the underlying store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Create an invalid record error.
    #[must_use]
    pub fn invalid(field: RecordField, token: impl Into<String>) -> Self {
        Self::InvalidRecordType {
            field,
            token: token.into(),
        }
    }

    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::EmptyAccountPath => "EMPTY_ACCOUNT_PATH",
            Self::Imbalance { .. } => "IMBALANCE",
            Self::InvalidRecordType { .. } => "INVALID_RECORD_TYPE",
            Self::MissingCounterpart(_) => "MISSING_COUNTERPART",
            Self::Precision(_) => "PRECISION",
            Self::LockUnavailable(_) => "LOCK_UNAVAILABLE",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if the caller may retry the same operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockUnavailable(_) | Self::LockTimeout { .. })
    }
}
