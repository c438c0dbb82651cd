//! Store error types.

use chrono::NaiveDate;
use thiserror::Error;
use tally_shared::types::{AccountId, Commodity};

/// Errors raised by a ledger store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No account with this identifier exists in the book.
    #[error("account {0} does not exist in the book")]
    AccountMissing(AccountId),

    /// A sibling with the same name already exists.
    #[error("account '{name}' already exists under {parent}")]
    DuplicateAccount {
        /// The rejected name.
        name: String,
        /// The parent account.
        parent: AccountId,
    },

    /// The account tree read from storage is inconsistent.
    #[error("account tree is corrupt: {0}")]
    CorruptTree(String),

    /// The commodity table has no such entry.
    #[error("unknown commodity {namespace}:{mnemonic}")]
    UnknownCommodity {
        /// Commodity namespace.
        namespace: String,
        /// Commodity mnemonic.
        mnemonic: String,
    },

    /// No price converts between the two commodities on or before the date.
    #[error("no price from {from} to {to} on or before {date}")]
    NoPrice {
        /// Source commodity.
        from: Commodity,
        /// Target commodity.
        to: Commodity,
        /// Conversion date.
        date: NaiveDate,
    },

    /// A price was added while no price edit was open.
    #[error("price database is not open for editing")]
    NoPriceEdit,

    /// Only draft transactions can be committed.
    #[error("transaction {0} is not a draft")]
    TransactionNotDraft(String),

    /// Arithmetic left the representable decimal range.
    #[error("decimal overflow while {0}")]
    Overflow(&'static str),

    /// Reading or writing the book failed.
    #[error("book I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The book could not be encoded or decoded.
    #[error("book serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a corrupt tree error.
    #[must_use]
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptTree(msg.into())
    }

    /// Create an unknown commodity error.
    #[must_use]
    pub fn unknown_commodity(namespace: &str, mnemonic: &str) -> Self {
        Self::UnknownCommodity {
            namespace: namespace.to_string(),
            mnemonic: mnemonic.to_string(),
        }
    }
}
