//! Session run modes and domains.

use serde::{Deserialize, Serialize};

/// Whether ledger mutations are persisted or only previewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Dry run: build and validate, then discard.
    #[default]
    Test,
    /// Commit balanced transactions and prices.
    Send,
}

impl RunMode {
    /// Returns true if built transactions and prices are kept.
    #[must_use]
    pub fn commits(self) -> bool {
        self == Self::Send
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Send => write!(f, "send"),
        }
    }
}

/// Which parts of the book a session edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionDomain {
    /// Trade transactions only.
    Transactions,
    /// Price database entries only.
    Prices,
    /// Both transactions and prices.
    #[default]
    Both,
}

impl SessionDomain {
    /// Returns true if the session opens an editable price database.
    #[must_use]
    pub fn includes_prices(self) -> bool {
        matches!(self, Self::Prices | Self::Both)
    }

    /// Returns true if the session records trade transactions.
    #[must_use]
    pub fn includes_transactions(self) -> bool {
        matches!(self, Self::Transactions | Self::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_commits() {
        assert!(RunMode::Send.commits());
        assert!(!RunMode::Test.commits());
        assert_eq!(RunMode::default(), RunMode::Test);
    }

    #[test]
    fn test_domain_flags() {
        assert!(SessionDomain::Prices.includes_prices());
        assert!(SessionDomain::Both.includes_prices());
        assert!(!SessionDomain::Transactions.includes_prices());
        assert!(SessionDomain::Transactions.includes_transactions());
        assert!(!SessionDomain::Prices.includes_transactions());
    }
}
