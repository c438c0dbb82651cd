//! Account tree nodes.

use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Commodity};

/// A node in the account tree.
///
/// The tree owns its children through `children`; `parent` is a plain link.
/// Names are unique among siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Name, unique under the parent.
    pub name: String,
    /// Denomination of the account's amounts.
    pub commodity: Commodity,
    /// Parent account; `None` only for the root.
    pub parent: Option<AccountId>,
    /// Child accounts in insertion order.
    #[serde(default)]
    pub children: Vec<AccountId>,
}

impl Account {
    /// Creates an account with no children.
    #[must_use]
    pub fn new(name: impl Into<String>, commodity: Commodity, parent: Option<AccountId>) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            commodity,
            parent,
            children: Vec::new(),
        }
    }

    /// Returns true if this is the root of the tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
