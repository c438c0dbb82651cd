//! Point-in-time account balances.
//!
//! Balances are read from the store in each account's own commodity and then
//! converted into the requested currency. Roll-ups sum over the whole subtree
//! with exact decimal addition.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, Commodity};
use tracing::debug;

use super::error::LedgerError;
use super::resolver::AccountResolver;
use crate::store::{LedgerStore, StoreError};

/// Computes balances against a ledger store.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Balance of `account` on `as_of` (inclusive), expressed in `currency`.
    ///
    /// The store-native balance is returned unchanged when the account's
    /// commodity already is `currency`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the account is missing or no price converts
    /// its commodity into `currency`.
    pub fn balance_as_of<S>(
        store: &S,
        account: AccountId,
        as_of: NaiveDate,
        currency: &Commodity,
    ) -> Result<Decimal, LedgerError>
    where
        S: LedgerStore + ?Sized,
    {
        let native = store.balance_as_of(account, as_of)?;
        let commodity = &store
            .account(account)
            .ok_or(StoreError::AccountMissing(account))?
            .commodity;

        if commodity == currency {
            return Ok(native);
        }
        Ok(store.convert(native, commodity, currency, as_of)?)
    }

    /// Resolves `path` below `root` and sums the balance of the account and
    /// every descendant.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the path does not resolve, or any error
    /// from [`Self::balance_as_of`].
    pub fn total_balance<S, P>(
        store: &S,
        root: AccountId,
        path: &[P],
        as_of: NaiveDate,
        currency: &Commodity,
    ) -> Result<Decimal, LedgerError>
    where
        S: LedgerStore + ?Sized,
        P: AsRef<str>,
    {
        let account = AccountResolver::resolve(store, root, path)?;
        let total = Self::subtree_balance(store, account, as_of, currency)?;
        debug!(account_id = %account, %as_of, %total, "Computed subtree balance");
        Ok(total)
    }

    /// Subtree totals for a set of named paths, keyed by name.
    ///
    /// # Errors
    ///
    /// Fails on the first path that cannot be resolved or valued.
    pub fn account_assets<S, P>(
        store: &S,
        root: AccountId,
        named_paths: &BTreeMap<String, Vec<P>>,
        as_of: NaiveDate,
        currency: &Commodity,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError>
    where
        S: LedgerStore + ?Sized,
        P: AsRef<str>,
    {
        named_paths
            .iter()
            .map(|(name, path)| {
                Self::total_balance(store, root, path, as_of, currency).map(|v| (name.clone(), v))
            })
            .collect()
    }

    fn subtree_balance<S>(
        store: &S,
        account: AccountId,
        as_of: NaiveDate,
        currency: &Commodity,
    ) -> Result<Decimal, LedgerError>
    where
        S: LedgerStore + ?Sized,
    {
        std::iter::once(account)
            .chain(store.descendants(account))
            .try_fold(Decimal::ZERO, |acc, id| {
                let balance = Self::balance_as_of(store, id, as_of, currency)?;
                acc.checked_add(balance)
                    .ok_or(LedgerError::Store(StoreError::Overflow("summing subtree balance")))
            })
    }
}
