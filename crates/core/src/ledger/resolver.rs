//! Account path resolution.

use std::collections::BTreeMap;

use tally_shared::types::AccountId;
use tracing::debug;

use super::error::LedgerError;
use crate::store::{LedgerStore, StoreError};

/// Resolves account paths inside a book.
pub struct AccountResolver;

impl AccountResolver {
    /// Walks `path` from `root`, one exact child-name lookup per segment.
    ///
    /// # Errors
    ///
    /// - `EmptyAccountPath` if `path` has no segments.
    /// - `AccountNotFound` with the name of the last account searched, on the
    ///   first segment that has no matching child.
    pub fn resolve<S, P>(store: &S, root: AccountId, path: &[P]) -> Result<AccountId, LedgerError>
    where
        S: LedgerStore + ?Sized,
        P: AsRef<str>,
    {
        if path.is_empty() {
            return Err(LedgerError::EmptyAccountPath);
        }

        let mut current = root;
        for segment in path {
            let name: &str = segment.as_ref();
            current = match store.lookup_child(current, name) {
                Some(child) => child,
                None => {
                    let searched = store
                        .account(current)
                        .ok_or(StoreError::AccountMissing(current))?
                        .name
                        .clone();
                    return Err(LedgerError::AccountNotFound {
                        path: path.iter().map(|p| AsRef::<str>::as_ref(p).to_owned()).collect(),
                        searched,
                    });
                }
            };
        }

        debug!(depth = path.len(), account_id = %current, "Resolved account path");
        Ok(current)
    }

    /// Finds the account called `name` under `parent`.
    ///
    /// Names listed in `special_locations` are resolved from the book root by
    /// their configured path instead.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub fn find_account<S>(
        store: &S,
        name: &str,
        parent: AccountId,
        special_locations: &BTreeMap<String, Vec<String>>,
    ) -> Result<AccountId, LedgerError>
    where
        S: LedgerStore + ?Sized,
    {
        match special_locations.get(name) {
            Some(location) => {
                let mut path = location.clone();
                path.push(name.to_string());
                Self::resolve(store, store.root_account(), &path)
            }
            None => Self::resolve(store, parent, &[name]),
        }
    }
}
