//! Property-based tests for trade transaction building.
//!
//! - Every committed transaction nets to exactly zero
//! - Holding trades add a fee split only when gross and net differ
//! - Unbalanced paired trades never reach the store

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::config::AccountCatalog;
use tally_shared::types::{Commodity, RunMode};

use super::builder::TransactionBuilder;
use super::error::LedgerError;
use super::record::{TradeKind, TxRecord};
use super::types::TradeContext;
use crate::store::{LedgerStore, MemoryBook};

fn book() -> (MemoryBook, TradeContext) {
    let cad = Commodity::currency("CAD");
    let mut book = MemoryBook::new(cad.clone());
    let root = book.root_account();
    let open = book.ensure_path(root, &["FAMILY", "INVEST", "OPEN"], &cad).unwrap();
    book.add_account(open, "A", Commodity::fund("A")).unwrap();
    book.add_account(open, "B", Commodity::fund("B")).unwrap();
    book.add_account(root, "HOLD", cad.clone()).unwrap();
    book.add_account(root, "FinServices", cad.clone()).unwrap();
    let revenue = book.ensure_path(root, &["REV_Invest", "Dist", "OPEN"], &cad).unwrap();
    (
        book,
        TradeContext {
            asset_parent: open,
            revenue_account: revenue,
        },
    )
}

fn record(kind: TradeKind, fund: &str, gross: i64, net: i64, units: i64) -> TxRecord {
    let date = NaiveDate::from_ymd_opt(2021, 5, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
    TxRecord::new(date, kind, fund).with_amounts(gross, net, units)
}

/// Cents up to ten million dollars either way.
fn cents() -> impl Strategy<Value = i64> {
    -1_000_000_000i64..1_000_000_000i64
}

fn units() -> impl Strategy<Value = i64> {
    -100_000_000i64..100_000_000i64
}

fn unpaired_kind() -> impl Strategy<Value = TradeKind> {
    prop::sample::select(
        TradeKind::ALL
            .into_iter()
            .filter(|k| !k.is_paired())
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any unpaired trade commits exactly one balanced transaction.
    #[test]
    fn prop_unpaired_trades_balance(
        kind in unpaired_kind(),
        gross in cents(),
        net in cents(),
        units in units(),
    ) {
        let (mut book, ctx) = book();
        let cad = Commodity::currency("CAD");
        let catalog = AccountCatalog::default();
        let tx1 = record(kind, "A", gross, net, units);

        let outcome = TransactionBuilder::new(&mut book, &cad, RunMode::Send, &catalog)
            .build_trade(&tx1, None, &ctx)
            .unwrap();

        prop_assert!(outcome.is_committed());
        for tx in book.transactions() {
            let sum: Decimal = tx.splits.iter().map(|s| s.value).sum();
            prop_assert_eq!(sum, Decimal::ZERO);
        }
    }

    /// Holding trades carry a third split exactly when gross != net.
    #[test]
    fn prop_fee_split_only_when_net_differs(
        gross in cents(),
        net in cents(),
        sell in any::<bool>(),
    ) {
        let (mut book, ctx) = book();
        let cad = Commodity::currency("CAD");
        let catalog = AccountCatalog::default();
        let kind = if sell { TradeKind::Redemption } else { TradeKind::Purchase };
        let tx1 = record(kind, "A", gross, net, 1);

        let tx = TransactionBuilder::new(&mut book, &cad, RunMode::Test, &catalog)
            .draft_trade(&tx1, None, &ctx)
            .unwrap();

        let expected = if gross == net { 2 } else { 3 };
        prop_assert_eq!(tx.splits.len(), expected);
        prop_assert!(tx.is_balanced());
    }

    /// Paired trades commit only when the two gross amounts cancel.
    #[test]
    fn prop_paired_trades_commit_only_when_balanced(
        gross in cents(),
        skew in -1_000i64..1_000i64,
        units in units(),
    ) {
        let (mut book, ctx) = book();
        let cad = Commodity::currency("CAD");
        let catalog = AccountCatalog::default();
        let tx1 = record(TradeKind::SwitchIn, "A", gross, gross, units);
        let tx2 = record(TradeKind::SwitchOut, "B", -gross + skew, -gross + skew, -units);

        let result = TransactionBuilder::new(&mut book, &cad, RunMode::Send, &catalog)
            .build_trade(&tx1, Some(&tx2), &ctx);

        if skew == 0 {
            prop_assert!(result.is_ok());
            prop_assert_eq!(book.transactions().count(), 1);
        } else {
            let is_imbalance = matches!(result, Err(LedgerError::Imbalance { .. }));
            prop_assert!(is_imbalance);
            prop_assert_eq!(book.transactions().count(), 0);
        }
    }
}
