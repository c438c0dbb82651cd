//! Report error types.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The period list is unusable.
    #[error("Invalid periods: {0}")]
    InvalidPeriods(String),

    /// Resolving or reading the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReportError {
    /// Create an invalid periods error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidPeriods(msg.into())
    }

    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriods(_) => "INVALID_PERIODS",
            Self::Ledger(e) => e.error_code(),
        }
    }
}
