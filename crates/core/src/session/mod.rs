//! Ledger sessions and store locking.
//!
//! - [`LockRegistry`] serializes access to each store across threads
//! - [`LedgerSession`] ties a lock, an open store and a run mode together

pub mod ledger;
pub mod lock;

pub use ledger::{AccountSummary, BatchFailure, BatchReport, LedgerSession, PeriodReport, SessionOptions};
pub use lock::{LockRegistry, StoreGuard, StoreLock};
