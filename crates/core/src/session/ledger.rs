//! Ledger sessions.
//!
//! A [`LedgerSession`] holds a store lock and an open store handle for the
//! duration of one unit of work. It exists only between
//! [`LedgerSession::open`] and [`LedgerSession::close`]; dropping it without
//! closing discards unsaved work and releases the lock.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::config::{AccountCatalog, FundCatalog, TallyConfig};
use tally_shared::types::commodity::CURRENCY_NAMESPACE;
use tally_shared::types::{AccountId, Commodity, RunMode, SessionDomain};
use tracing::{debug, info, warn};

use super::lock::{LockRegistry, StoreGuard};
use crate::ledger::{
    AccountResolver, BalanceCalculator, InvestmentRecord, LedgerError, PlanType, Price, PriceRecorder,
    TradeContext, TradeOutcome, TransactionBuilder, TxRecord,
};
use crate::reports::{PeriodAggregator, PeriodBucket, PeriodRow, ReportError, period_starts, report_rows, reset_periods};
use crate::store::{LedgerStore, StoreBackend, StoreError};

/// How a session is opened.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Dry run or commit.
    pub mode: RunMode,
    /// Which parts of the book the session edits.
    pub domain: SessionDomain,
    /// Session currency; looked up from `default_currency` when unset.
    pub currency: Option<Commodity>,
    /// ISO 4217 code used when `currency` is unset.
    pub default_currency: String,
    /// Bounded wait for the store lock; blocks indefinitely when unset.
    pub lock_timeout: Option<Duration>,
    /// Account names and paths.
    pub accounts: AccountCatalog,
    /// Fund catalog.
    pub funds: FundCatalog,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            domain: SessionDomain::default(),
            currency: None,
            default_currency: "CAD".to_string(),
            lock_timeout: None,
            accounts: AccountCatalog::default(),
            funds: FundCatalog::default(),
        }
    }
}

impl SessionOptions {
    /// Options taken from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &TallyConfig) -> Self {
        Self {
            mode: config.ledger.mode,
            domain: config.ledger.domain,
            currency: None,
            default_currency: config.ledger.default_currency.clone(),
            lock_timeout: config.lock_timeout(),
            accounts: config.accounts.clone(),
            funds: config.funds.clone(),
        }
    }

    /// Sets the run mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the session domain.
    #[must_use]
    pub fn with_domain(mut self, domain: SessionDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Sets the session currency explicitly.
    #[must_use]
    pub fn with_currency(mut self, currency: Commodity) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Bounds the wait for the store lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

/// Period sums for one account subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    /// Name of the reported account.
    pub account: String,
    /// One row per period.
    pub rows: Vec<PeriodRow>,
}

/// An account and the names of everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Account name.
    pub name: String,
    /// Account commodity.
    pub commodity: Commodity,
    /// Descendant names, depth-first.
    pub descendants: Vec<String>,
}

/// A statement line that could not be recorded.
#[derive(Debug)]
pub struct BatchFailure {
    /// Plan the line belongs to.
    pub plan: PlanType,
    /// Position of the line within the plan's trades or prices.
    pub index: usize,
    /// Why it failed.
    pub error: LedgerError,
}

/// Outcome of recording a whole statement.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Trades committed to the book.
    pub committed: usize,
    /// Balanced trades discarded by a dry run.
    pub discarded: usize,
    /// Prices built.
    pub prices: usize,
    /// Price lines skipped for money-market funds.
    pub skipped_prices: usize,
    /// Lines that failed; earlier successes stay recorded.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Returns true if every line was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, plan: PlanType, index: usize, error: LedgerError) {
        warn!(%plan, index, code = error.error_code(), %error, "Statement line not recorded");
        self.failures.push(BatchFailure { plan, index, error });
    }
}

/// An open, locked ledger session.
///
/// The store is declared before the guard so that a dropped session discards
/// its store before the lock is released.
pub struct LedgerSession<B: StoreBackend> {
    store: B::Store,
    guard: StoreGuard,
    options: SessionOptions,
    currency: Commodity,
}

impl<B: StoreBackend> std::fmt::Debug for LedgerSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSession")
            .field("store", &self.guard.store())
            .field("mode", &self.options.mode)
            .field("domain", &self.options.domain)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl<B: StoreBackend> LedgerSession<B> {
    /// Locks the backend's store, opens it and prepares it for editing.
    ///
    /// # Errors
    ///
    /// - `LockTimeout` if `options.lock_timeout` elapses first.
    /// - `Store` if the book cannot be opened or the default currency is not
    ///   in its commodity table.
    pub fn open(
        registry: &LockRegistry,
        backend: &B,
        options: SessionOptions,
        is_new: bool,
    ) -> Result<Self, LedgerError> {
        let store_id = backend.store_id();
        let guard = match options.lock_timeout {
            Some(timeout) => registry.acquire_timeout(&store_id, timeout)?,
            None => registry.acquire(&store_id),
        };

        let mut store = backend.open(is_new)?;

        let currency = match &options.currency {
            Some(currency) => currency.clone(),
            None => {
                let code = options.default_currency.to_uppercase();
                store
                    .lookup_commodity(CURRENCY_NAMESPACE, &code)
                    .ok_or_else(|| StoreError::unknown_commodity(CURRENCY_NAMESPACE, &code))?
            }
        };

        if options.domain.includes_prices() {
            store.begin_price_edit();
        }

        info!(
            store = %store_id,
            mode = %options.mode,
            domain = ?options.domain,
            %currency,
            is_new,
            "Ledger session opened"
        );
        Ok(Self {
            store,
            guard,
            options,
            currency,
        })
    }

    /// Ends the session.
    ///
    /// `persist` defaults to the run mode: send sessions save, test sessions
    /// do not. When saving, pending prices are committed first. The store is
    /// ended and the lock released whether or not saving succeeds.
    ///
    /// # Errors
    ///
    /// Returns the store error if committing prices or saving fails.
    pub fn close(self, persist: Option<bool>) -> Result<(), LedgerError> {
        let Self {
            mut store,
            guard,
            options,
            ..
        } = self;
        let persist = persist.unwrap_or_else(|| options.mode.commits());

        let result = if persist {
            Self::persist(&mut store, options.domain)
        } else {
            let dropped = if options.domain.includes_prices() {
                store.rollback_price_edit()
            } else {
                0
            };
            info!(store = %guard.store(), dropped_prices = dropped, "Session closed without saving");
            Ok(())
        };

        store.end();
        if let Err(error) = &result {
            warn!(store = %guard.store(), %error, "Session save failed");
        }
        drop(guard);
        result
    }

    fn persist(store: &mut B::Store, domain: SessionDomain) -> Result<(), LedgerError> {
        if domain.includes_prices() {
            let committed = store.commit_price_edit()?;
            info!(committed, "Committed price edits");
        }
        store.save()?;
        info!("Session saved");
        Ok(())
    }

    // ========== Accessors ==========

    /// The open store.
    #[must_use]
    pub fn store(&self) -> &B::Store {
        &self.store
    }

    /// Identity of the locked store.
    #[must_use]
    pub fn store_id(&self) -> &str {
        self.guard.store()
    }

    /// Session currency.
    #[must_use]
    pub fn currency(&self) -> &Commodity {
        &self.currency
    }

    /// Run mode.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.options.mode
    }

    /// Session domain.
    #[must_use]
    pub fn domain(&self) -> SessionDomain {
        self.options.domain
    }

    // ========== Accounts ==========

    /// The book's root account.
    #[must_use]
    pub fn root_account(&self) -> AccountId {
        self.store.root_account()
    }

    /// The account called `name` under `parent`, or under the root when
    /// `parent` is `None`. Funds with a configured special location are
    /// found there instead.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no such account exists.
    pub fn account(&self, name: &str, parent: Option<AccountId>) -> Result<AccountId, LedgerError> {
        let parent = parent.unwrap_or_else(|| self.store.root_account());
        AccountResolver::find_account(&self.store, name, parent, &self.options.accounts.special_locations)
    }

    /// The asset account holding `plan` for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecordType` for an unknown owner of a registered plan,
    /// or `AccountNotFound` if the path is missing from the book.
    pub fn asset_account(&self, plan: PlanType, owner: &str) -> Result<AccountId, LedgerError> {
        let path = plan.asset_path(&self.options.accounts, owner)?;
        let account = AccountResolver::resolve(&self.store, self.store.root_account(), &path)?;
        debug!(%plan, owner, account_id = %account, "Resolved asset account");
        Ok(account)
    }

    /// The revenue account for `plan` and `owner`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::asset_account`].
    pub fn revenue_account(&self, plan: PlanType, owner: &str) -> Result<AccountId, LedgerError> {
        let path = plan.revenue_path(&self.options.accounts, owner)?;
        let account = AccountResolver::resolve(&self.store, self.store.root_account(), &path)?;
        debug!(%plan, owner, account_id = %account, "Resolved revenue account");
        Ok(account)
    }

    /// Names an account and all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the path does not resolve.
    pub fn describe_account<P: AsRef<str>>(&self, path: &[P]) -> Result<AccountSummary, LedgerError> {
        let id = AccountResolver::resolve(&self.store, self.store.root_account(), path)?;
        let account = self.store.account(id).ok_or(StoreError::AccountMissing(id))?;
        let descendants: Vec<String> = self
            .store
            .descendants(id)
            .into_iter()
            .filter_map(|d| self.store.account(d).map(|a| a.name.clone()))
            .collect();

        if descendants.is_empty() {
            debug!(account = %account.name, "Account has no descendants");
        }
        Ok(AccountSummary {
            name: account.name.clone(),
            commodity: account.commodity.clone(),
            descendants,
        })
    }

    // ========== Balances ==========

    /// Balance of one account on `as_of`, in `currency` or the session
    /// currency.
    ///
    /// # Errors
    ///
    /// Returns a store error if the account is missing or cannot be valued.
    pub fn balance_as_of(
        &self,
        account: AccountId,
        as_of: NaiveDate,
        currency: Option<&Commodity>,
    ) -> Result<Decimal, LedgerError> {
        BalanceCalculator::balance_as_of(&self.store, account, as_of, currency.unwrap_or(&self.currency))
    }

    /// Balance of the subtree at `path` on `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a valuation error.
    pub fn total_balance<P: AsRef<str>>(
        &self,
        path: &[P],
        as_of: NaiveDate,
        currency: Option<&Commodity>,
    ) -> Result<Decimal, LedgerError> {
        BalanceCalculator::total_balance(
            &self.store,
            self.store.root_account(),
            path,
            as_of,
            currency.unwrap_or(&self.currency),
        )
    }

    /// Subtree balances for a set of named paths.
    ///
    /// # Errors
    ///
    /// Fails on the first path that cannot be resolved or valued.
    pub fn account_assets<P: AsRef<str>>(
        &self,
        named_paths: &BTreeMap<String, Vec<P>>,
        as_of: NaiveDate,
        currency: Option<&Commodity>,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError> {
        BalanceCalculator::account_assets(
            &self.store,
            self.store.root_account(),
            named_paths,
            as_of,
            currency.unwrap_or(&self.currency),
        )
    }

    // ========== Reports ==========

    /// Clears `periods`, fills them with the splits of the subtree at `path`
    /// and returns the report rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriods` or a resolution error.
    pub fn period_report<P: AsRef<str>>(
        &self,
        path: &[P],
        periods: &mut [PeriodBucket],
    ) -> Result<PeriodReport, ReportError> {
        reset_periods(periods);
        let starts = period_starts(periods);
        let account = PeriodAggregator::fill_splits(&self.store, self.store.root_account(), path, &starts, periods)?;
        info!(%account, periods = periods.len(), "Period report built");
        Ok(PeriodReport {
            account,
            rows: report_rows(periods),
        })
    }

    // ========== Recording ==========

    /// Accounts a trade for `plan` and `owner` is placed against.
    ///
    /// # Errors
    ///
    /// Same as [`Self::asset_account`].
    pub fn trade_context(&self, plan: PlanType, owner: &str) -> Result<TradeContext, LedgerError> {
        Ok(TradeContext {
            asset_parent: self.asset_account(plan, owner)?,
            revenue_account: self.revenue_account(plan, owner)?,
        })
    }

    /// Builds, checks and, in send mode, commits one trade.
    ///
    /// # Errors
    ///
    /// Any error from building the transaction; nothing is committed then.
    pub fn record_trade(
        &mut self,
        plan: PlanType,
        owner: &str,
        tx1: &TxRecord,
        tx2: Option<&TxRecord>,
    ) -> Result<TradeOutcome, LedgerError> {
        let ctx = self.trade_context(plan, owner)?;
        TransactionBuilder::new(&mut self.store, &self.currency, self.options.mode, &self.options.accounts)
            .build_trade(tx1, tx2, &ctx)
    }

    /// Builds the price for a statement price line of `plan`. Money-market
    /// funds yield `None`.
    ///
    /// # Errors
    ///
    /// Any error from resolving the fund account or parsing the price.
    pub fn record_price(&mut self, plan: PlanType, owner: &str, record: &TxRecord) -> Result<Option<Price>, LedgerError> {
        let asset_parent = self.asset_account(plan, owner)?;
        PriceRecorder::new(&mut self.store, self.options.mode, &self.options.accounts, &self.options.funds)
            .build_price(record, asset_parent, &self.currency)
    }

    /// Records every line of `statement` the session's domain covers.
    ///
    /// Each line is attempted; failures are collected and do not undo
    /// earlier lines.
    pub fn record_statement(&mut self, statement: &InvestmentRecord) -> BatchReport {
        let mut report = BatchReport::default();
        info!(
            owner = %statement.owner,
            source = %statement.source_file,
            lines = statement.size(None, None),
            "Recording statement"
        );

        for plan in PlanType::ALL {
            if self.options.domain.includes_prices() {
                self.record_plan_prices(statement, plan, &mut report);
            }
            if self.options.domain.includes_transactions() {
                self.record_plan_trades(statement, plan, &mut report);
            }
        }

        info!(
            committed = report.committed,
            discarded = report.discarded,
            prices = report.prices,
            failures = report.failures.len(),
            "Statement recorded"
        );
        report
    }

    fn record_plan_prices(&mut self, statement: &InvestmentRecord, plan: PlanType, report: &mut BatchReport) {
        for (index, record) in statement.prices(plan).iter().enumerate() {
            match self.record_price(plan, &statement.owner, record) {
                Ok(Some(_)) => report.prices += 1,
                Ok(None) => report.skipped_prices += 1,
                Err(error) => report.fail(plan, index, error),
            }
        }
    }

    fn record_plan_trades(&mut self, statement: &InvestmentRecord, plan: PlanType, report: &mut BatchReport) {
        for (index, pair) in statement.pair_trades(plan) {
            let result = pair.and_then(|(tx1, tx2)| self.record_trade(plan, &statement.owner, tx1, tx2));
            match result {
                Ok(outcome) if outcome.is_committed() => report.committed += 1,
                Ok(_) => report.discarded += 1,
                Err(error) => report.fail(plan, index, error),
            }
        }
    }
}
