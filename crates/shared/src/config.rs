//! Application configuration management.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::{PeriodSpan, RunMode, SessionDomain};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TallyConfig {
    /// Ledger store configuration.
    pub ledger: LedgerConfig,
    /// Account path tables.
    #[serde(default)]
    pub accounts: AccountCatalog,
    /// Fund catalog.
    #[serde(default)]
    pub funds: FundCatalog,
    /// Period report run by the report binary.
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

/// Ledger store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Location of the ledger book.
    pub path: PathBuf,
    /// Dry run or commit.
    #[serde(default)]
    pub mode: RunMode,
    /// Parts of the book the session edits.
    #[serde(default)]
    pub domain: SessionDomain,
    /// Currency used when a caller does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Bounded wait for the store lock; blocks indefinitely when unset.
    #[serde(default)]
    pub lock_timeout_secs: Option<u64>,
}

fn default_currency() -> String {
    "CAD".to_string()
}

/// Account names and paths used to place trade splits.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountCatalog {
    /// Holding account under the root, receives redemption and purchase cash.
    #[serde(default = "default_holding")]
    pub holding: String,
    /// Financial services expense account under the root.
    #[serde(default = "default_fin_services")]
    pub fin_services: String,
    /// Path from the root to the per-plan asset accounts.
    #[serde(default = "default_asset_root")]
    pub asset_root: Vec<String>,
    /// Path from the root to the per-plan revenue accounts.
    #[serde(default = "default_revenue_root")]
    pub revenue_root: Vec<String>,
    /// Plan owner name to the path segments below a registered plan account.
    #[serde(default)]
    pub owners: BTreeMap<String, Vec<String>>,
    /// Funds held outside the plan tree, keyed by fund name, with their path from the root.
    #[serde(default)]
    pub special_locations: BTreeMap<String, Vec<String>>,
}

fn default_holding() -> String {
    "HOLD".to_string()
}

fn default_fin_services() -> String {
    "FinServices".to_string()
}

fn default_asset_root() -> Vec<String> {
    vec!["FAMILY".to_string(), "INVEST".to_string()]
}

fn default_revenue_root() -> Vec<String> {
    vec!["REV_Invest".to_string(), "Dist".to_string()]
}

impl Default for AccountCatalog {
    fn default() -> Self {
        Self {
            holding: default_holding(),
            fin_services: default_fin_services(),
            asset_root: default_asset_root(),
            revenue_root: default_revenue_root(),
            owners: BTreeMap::new(),
            special_locations: BTreeMap::new(),
        }
    }
}

/// Static fund data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundCatalog {
    /// Funds with a fixed unit value; no price series is recorded for them.
    #[serde(default)]
    pub money_market: Vec<String>,
}

impl FundCatalog {
    /// Returns true if the fund is a money-market fund.
    #[must_use]
    pub fn is_money_market(&self, fund: &str) -> bool {
        self.money_market.iter().any(|f| f == fund)
    }
}

/// Period report settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Path from the root to the reported account.
    pub account_path: Vec<String>,
    /// Start of the first period.
    pub first_period: NaiveDate,
    /// Length of each period.
    #[serde(default = "default_span")]
    pub span: PeriodSpan,
    /// Number of periods.
    #[serde(default = "default_periods")]
    pub periods: u32,
}

fn default_span() -> PeriodSpan {
    PeriodSpan::Quarter
}

fn default_periods() -> u32 {
    4
}

impl TallyConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Bounded lock wait, if configured.
    #[must_use]
    pub fn lock_timeout(&self) -> Option<std::time::Duration> {
        self.ledger.lock_timeout_secs.map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
