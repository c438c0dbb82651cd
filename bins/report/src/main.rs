//! Tally period report
//!
//! Opens the configured ledger book and prints a period report as JSON.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::reports::PeriodBucket;
use tally_core::session::{LedgerSession, LockRegistry, SessionOptions};
use tally_core::store::JsonFileBackend;
use tally_shared::TallyConfig;
use tally_shared::types::Commodity;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TallyConfig::load().context("Failed to load configuration")?;
    let report = config
        .report
        .clone()
        .context("No [report] section configured")?;

    let currency = Commodity::currency(&config.ledger.default_currency);
    let backend = JsonFileBackend::new(&config.ledger.path, currency);
    let registry = LockRegistry::new();

    let options = SessionOptions::from_config(&config);
    let session = LedgerSession::open(&registry, &backend, options, false)
        .with_context(|| format!("Failed to open ledger {}", config.ledger.path.display()))?;
    info!(store = %session.store_id(), currency = %session.currency(), "Building period report");

    let mut periods = PeriodBucket::sequence(report.first_period, report.span, report.periods)?;
    let result = session.period_report(&report.account_path, &mut periods);

    // Reports never write the book.
    session.close(Some(false))?;

    let rows = result?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
