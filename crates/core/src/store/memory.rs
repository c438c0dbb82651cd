//! In-memory ledger book.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Commodity, TransactionId};
use tracing::{debug, info, warn};

use super::{LedgerStore, StoreError};
use crate::currency::ExchangeRate;
use crate::ledger::{Account, Price, Split, Transaction};

/// Name given to the root account of a new book.
pub const ROOT_ACCOUNT_NAME: &str = "Root Account";

/// Where a book handle writes itself back on save.
#[derive(Debug, Clone)]
pub(crate) enum BookSink {
    /// A book shared in-process.
    Shared(Arc<Mutex<MemoryBook>>),
    /// A JSON file on disk.
    File(PathBuf),
}

/// A complete ledger book held in memory.
///
/// Accounts form a single tree under `root`. Only committed transactions are
/// stored; drafts live with their builder until committed or dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBook {
    root: AccountId,
    currency: Commodity,
    accounts: BTreeMap<AccountId, Account>,
    #[serde(default)]
    transactions: BTreeMap<TransactionId, Transaction>,
    #[serde(default)]
    commodities: Vec<Commodity>,
    #[serde(default)]
    prices: Vec<Price>,
    #[serde(skip)]
    pending_prices: Option<Vec<Price>>,
    #[serde(skip)]
    sink: Option<BookSink>,
}

impl MemoryBook {
    /// Creates an empty book with a root account denominated in `currency`.
    #[must_use]
    pub fn new(currency: Commodity) -> Self {
        let root = Account::new(ROOT_ACCOUNT_NAME, currency.clone(), None);
        let root_id = root.id;
        let mut accounts = BTreeMap::new();
        accounts.insert(root_id, root);

        Self {
            root: root_id,
            commodities: vec![currency.clone()],
            currency,
            accounts,
            transactions: BTreeMap::new(),
            prices: Vec::new(),
            pending_prices: None,
            sink: None,
        }
    }

    /// Default currency of the book.
    #[must_use]
    pub fn currency(&self) -> &Commodity {
        &self.currency
    }

    /// Adds a commodity to the commodity table if it is not already there.
    pub fn add_commodity(&mut self, commodity: Commodity) {
        if !self.commodities.contains(&commodity) {
            self.commodities.push(commodity);
        }
    }

    /// Adds an account under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent does not exist or already has a child
    /// with the same name.
    pub fn add_account(
        &mut self,
        parent: AccountId,
        name: &str,
        commodity: Commodity,
    ) -> Result<AccountId, StoreError> {
        if !self.accounts.contains_key(&parent) {
            return Err(StoreError::AccountMissing(parent));
        }
        if self.lookup_child(parent, name).is_some() {
            return Err(StoreError::DuplicateAccount {
                name: name.to_string(),
                parent,
            });
        }

        self.add_commodity(commodity.clone());
        let account = Account::new(name, commodity, Some(parent));
        let id = account.id;
        self.accounts.insert(id, account);
        if let Some(p) = self.accounts.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// Adds the accounts along `path` below `parent` that do not exist yet.
    /// Returns the last account of the path.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not exist.
    pub fn ensure_path<S: AsRef<str>>(
        &mut self,
        parent: AccountId,
        path: &[S],
        commodity: &Commodity,
    ) -> Result<AccountId, StoreError> {
        let mut current = parent;
        for segment in path {
            let name = segment.as_ref();
            current = match self.lookup_child(current, name) {
                Some(id) => id,
                None => self.add_account(current, name, commodity.clone())?,
            };
        }
        Ok(current)
    }

    /// Committed transactions, in id order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Committed prices.
    #[must_use]
    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    /// Checks the account tree read from an untrusted source.
    ///
    /// # Errors
    ///
    /// Returns `CorruptTree` describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), StoreError> {
        let root = self
            .accounts
            .get(&self.root)
            .ok_or_else(|| StoreError::corrupt("root account is missing"))?;
        if !root.is_root() {
            return Err(StoreError::corrupt("root account has a parent"));
        }

        for account in self.accounts.values() {
            if account.id != self.root {
                let parent_id = account.parent.ok_or_else(|| {
                    StoreError::corrupt(format!("account '{}' is a second root", account.name))
                })?;
                let parent = self.accounts.get(&parent_id).ok_or_else(|| {
                    StoreError::corrupt(format!("account '{}' has a missing parent", account.name))
                })?;
                if !parent.children.contains(&account.id) {
                    return Err(StoreError::corrupt(format!(
                        "account '{}' is not listed under its parent '{}'",
                        account.name, parent.name
                    )));
                }
            }

            let mut names = BTreeSet::new();
            for child_id in &account.children {
                let child = self.accounts.get(child_id).ok_or_else(|| {
                    StoreError::corrupt(format!("account '{}' lists a missing child", account.name))
                })?;
                if child.parent != Some(account.id) {
                    return Err(StoreError::corrupt(format!(
                        "account '{}' lists '{}' which belongs elsewhere",
                        account.name, child.name
                    )));
                }
                if !names.insert(child.name.as_str()) {
                    return Err(StoreError::corrupt(format!(
                        "duplicate name '{}' under '{}'",
                        child.name, account.name
                    )));
                }
            }
        }

        // Every account must be reachable from the root exactly once.
        let mut seen = BTreeSet::from([self.root]);
        for id in self.descendants(self.root) {
            if !seen.insert(id) {
                return Err(StoreError::corrupt(format!("account {id} is reachable twice")));
            }
        }
        if seen.len() != self.accounts.len() {
            return Err(StoreError::corrupt("account tree contains a cycle or detached branch"));
        }

        for tx in self.transactions.values() {
            if let Some(split) = tx.splits.iter().find(|s| !self.accounts.contains_key(&s.account)) {
                return Err(StoreError::corrupt(format!(
                    "transaction {} posts to missing account {}",
                    tx.id, split.account
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn attach(mut self, sink: BookSink) -> Self {
        self.sink = Some(sink);
        self
    }

    fn detached(&self) -> Self {
        let mut book = self.clone();
        book.sink = None;
        book.pending_prices = None;
        book
    }

    fn latest_price(&self, from: &Commodity, to: &Commodity, date: NaiveDate) -> Option<&Price> {
        self.prices
            .iter()
            .filter(|p| &p.commodity == from && &p.currency == to && p.date <= date)
            .max_by_key(|p| p.date)
    }
}

impl LedgerStore for MemoryBook {
    fn root_account(&self) -> AccountId {
        self.root
    }

    fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    fn lookup_child(&self, parent: AccountId, name: &str) -> Option<AccountId> {
        self.accounts.get(&parent)?.children.iter().copied().find(|id| {
            self.accounts
                .get(id)
                .is_some_and(|child| child.name == name)
        })
    }

    fn descendants(&self, id: AccountId) -> Vec<AccountId> {
        let mut result = Vec::new();
        let mut stack: Vec<AccountId> = match self.accounts.get(&id) {
            Some(account) => account.children.iter().rev().copied().collect(),
            None => return result,
        };

        while let Some(current) = stack.pop() {
            // A malformed tree must not loop forever.
            if result.len() > self.accounts.len() {
                break;
            }
            result.push(current);
            if let Some(account) = self.accounts.get(&current) {
                stack.extend(account.children.iter().rev().copied());
            }
        }
        result
    }

    fn splits(&self, account: AccountId) -> Vec<&Split> {
        self.transactions
            .values()
            .flat_map(|tx| tx.splits.iter())
            .filter(|s| s.account == account)
            .collect()
    }

    fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    fn balance_as_of(&self, account: AccountId, date: NaiveDate) -> Result<Decimal, StoreError> {
        if !self.accounts.contains_key(&account) {
            return Err(StoreError::AccountMissing(account));
        }

        self.transactions
            .values()
            .filter(|tx| tx.date <= date)
            .flat_map(|tx| tx.splits.iter())
            .filter(|s| s.account == account)
            .try_fold(Decimal::ZERO, |acc, s| {
                acc.checked_add(s.amount)
                    .ok_or(StoreError::Overflow("summing account balance"))
            })
    }

    fn convert(
        &self,
        amount: Decimal,
        from: &Commodity,
        to: &Commodity,
        date: NaiveDate,
    ) -> Result<Decimal, StoreError> {
        if from == to {
            return Ok(amount);
        }

        let converted = if let Some(price) = self.latest_price(from, to, date) {
            ExchangeRate::from_price(price).apply(amount)
        } else if let Some(price) = self.latest_price(to, from, date) {
            ExchangeRate::from_price(price).apply_inverse(amount)
        } else {
            return Err(StoreError::NoPrice {
                from: from.clone(),
                to: to.clone(),
                date,
            });
        };

        converted.ok_or(StoreError::Overflow("converting between commodities"))
    }

    fn lookup_commodity(&self, namespace: &str, mnemonic: &str) -> Option<Commodity> {
        self.commodities
            .iter()
            .find(|c| c.namespace == namespace && c.mnemonic == mnemonic)
            .cloned()
    }

    fn commit_transaction(&mut self, mut tx: Transaction) -> Result<TransactionId, StoreError> {
        if !tx.is_editable() {
            return Err(StoreError::TransactionNotDraft(tx.id.to_string()));
        }
        if let Some(split) = tx.splits.iter().find(|s| !self.accounts.contains_key(&s.account)) {
            return Err(StoreError::AccountMissing(split.account));
        }

        tx.mark_committed();
        let id = tx.id;
        debug!(transaction_id = %id, splits = tx.splits.len(), "Transaction committed to book");
        self.transactions.insert(id, tx);
        Ok(id)
    }

    fn begin_price_edit(&mut self) {
        if self.pending_prices.is_none() {
            self.pending_prices = Some(Vec::new());
        }
    }

    fn add_price(&mut self, price: Price) -> Result<(), StoreError> {
        let pending = self.pending_prices.as_mut().ok_or(StoreError::NoPriceEdit)?;
        pending.push(price);
        Ok(())
    }

    fn commit_price_edit(&mut self) -> Result<usize, StoreError> {
        let pending = self.pending_prices.take().ok_or(StoreError::NoPriceEdit)?;
        let count = pending.len();
        for price in pending {
            self.prices.retain(|p| !p.same_key(&price));
            self.prices.push(price);
        }
        debug!(count, "Price edit committed");
        Ok(count)
    }

    fn rollback_price_edit(&mut self) -> usize {
        let dropped = self.pending_prices.take().map_or(0, |p| p.len());
        if dropped > 0 {
            warn!(dropped, "Pending prices rolled back");
        }
        dropped
    }

    fn save(&mut self) -> Result<(), StoreError> {
        match &self.sink {
            Some(BookSink::Shared(shared)) => {
                let snapshot = self.detached();
                let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                *guard = snapshot;
                info!(transactions = self.transactions.len(), "Book saved in memory");
            }
            Some(BookSink::File(path)) => {
                let json = serde_json::to_string_pretty(self)?;
                std::fs::write(path, json)?;
                info!(path = %path.display(), transactions = self.transactions.len(), "Book saved to file");
            }
            None => debug!("Book has no save target; nothing written"),
        }
        Ok(())
    }

    fn end(mut self) {
        let dropped = self.rollback_price_edit();
        debug!(dropped_prices = dropped, "Book session ended");
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
