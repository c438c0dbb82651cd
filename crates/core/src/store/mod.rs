//! Ledger store abstraction.
//!
//! The ledger core reads and writes accounts, transactions and prices only
//! through [`LedgerStore`]. A [`StoreBackend`] knows where a store lives and
//! opens a handle onto it for one session.
//!
//! [`MemoryBook`] is the in-process implementation shared by both shipped
//! backends.

pub mod backend;
pub mod error;
pub mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, Commodity, TransactionId};

use crate::ledger::{Account, Price, Split, Transaction};

pub use backend::{JsonFileBackend, MemoryBackend};
pub use error::StoreError;
pub use memory::MemoryBook;

/// An open handle onto a ledger book.
pub trait LedgerStore {
    // ========== Navigation ==========

    /// The root of the account tree.
    fn root_account(&self) -> AccountId;

    /// Looks up an account by id.
    fn account(&self, id: AccountId) -> Option<&Account>;

    /// Finds the child of `parent` with exactly `name`.
    fn lookup_child(&self, parent: AccountId, name: &str) -> Option<AccountId>;

    /// All accounts below `id`, depth-first, excluding `id` itself.
    fn descendants(&self, id: AccountId) -> Vec<AccountId>;

    // ========== Data ==========

    /// Committed splits posted to `account`, in no particular order.
    fn splits(&self, account: AccountId) -> Vec<&Split>;

    /// Looks up a committed transaction.
    fn transaction(&self, id: TransactionId) -> Option<&Transaction>;

    // ========== Valuation ==========

    /// Sum of split amounts on `account` dated on or before `date`, in the
    /// account's own commodity.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the sum overflows.
    fn balance_as_of(&self, account: AccountId, date: NaiveDate) -> Result<Decimal, StoreError>;

    /// Converts `amount` of `from` into `to` using prices on or before `date`.
    ///
    /// # Errors
    ///
    /// Returns `NoPrice` if no price links the two commodities.
    fn convert(
        &self,
        amount: Decimal,
        from: &Commodity,
        to: &Commodity,
        date: NaiveDate,
    ) -> Result<Decimal, StoreError>;

    /// Looks up a commodity in the book's commodity table.
    fn lookup_commodity(&self, namespace: &str, mnemonic: &str) -> Option<Commodity>;

    // ========== Writes ==========

    /// Commits a draft transaction to the book.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is not a draft or references an
    /// unknown account.
    fn commit_transaction(&mut self, tx: Transaction) -> Result<TransactionId, StoreError>;

    /// Opens the price database for editing.
    fn begin_price_edit(&mut self);

    /// Adds a price to the open price edit.
    ///
    /// # Errors
    ///
    /// Returns `NoPriceEdit` if no edit is open.
    fn add_price(&mut self, price: Price) -> Result<(), StoreError>;

    /// Commits pending prices, replacing entries with the same key.
    /// Returns the number of prices committed.
    ///
    /// # Errors
    ///
    /// Returns `NoPriceEdit` if no edit is open.
    fn commit_price_edit(&mut self) -> Result<usize, StoreError>;

    /// Drops pending prices. Returns how many were dropped.
    fn rollback_price_edit(&mut self) -> usize;

    // ========== Persistence ==========

    /// Persists the book to wherever it was opened from.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn save(&mut self) -> Result<(), StoreError>;

    /// Ends the session on this handle. Unsaved changes are lost.
    fn end(self)
    where
        Self: Sized;
}

/// Knows where a book lives and opens handles onto it.
pub trait StoreBackend {
    /// Handle type returned by [`StoreBackend::open`].
    type Store: LedgerStore;

    /// Identity of the underlying book; sessions on the same identity
    /// exclude each other.
    fn store_id(&self) -> String;

    /// Opens the book, creating an empty one when `is_new` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the book cannot be read or fails validation.
    fn open(&self, is_new: bool) -> Result<Self::Store, StoreError>;
}
