//! Price database entries from statement price lines.

use std::str::FromStr;

use rust_decimal::Decimal;
use tally_shared::config::{AccountCatalog, FundCatalog};
use tally_shared::types::commodity::UNITS_SCALE;
use tally_shared::types::{AccountId, Commodity, RunMode};
use tracing::{debug, info};

use super::error::LedgerError;
use super::record::TxRecord;
use super::resolver::AccountResolver;
use super::types::Price;
use crate::store::{LedgerStore, StoreError};

/// Parses a printed unit price such as `$1,234.5678`.
///
/// # Errors
///
/// Returns `Precision` if the text is not a decimal with at most four places.
pub fn parse_price(text: &str) -> Result<Decimal, LedgerError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    let mut value =
        Decimal::from_str(&cleaned).map_err(|_| LedgerError::Precision(format!("price '{text}'")))?;
    if value.scale() > UNITS_SCALE {
        return Err(LedgerError::Precision(format!(
            "price '{text}' has more than {UNITS_SCALE} decimal places"
        )));
    }
    value.rescale(UNITS_SCALE);
    Ok(value)
}

/// Builds price entries against an open store.
pub struct PriceRecorder<'a, S: LedgerStore + ?Sized> {
    store: &'a mut S,
    mode: RunMode,
    accounts: &'a AccountCatalog,
    funds: &'a FundCatalog,
}

impl<'a, S: LedgerStore + ?Sized> PriceRecorder<'a, S> {
    /// Creates a recorder writing to `store`.
    pub fn new(store: &'a mut S, mode: RunMode, accounts: &'a AccountCatalog, funds: &'a FundCatalog) -> Self {
        Self {
            store,
            mode,
            accounts,
            funds,
        }
    }

    /// Builds the net-asset-value price for a statement price line.
    ///
    /// Money-market funds have no price series and yield `None`. In send mode
    /// the price is added to the open price edit; in test mode it is only
    /// returned.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the fund has no account under `asset_parent`.
    /// - `Precision` if the printed price cannot be parsed exactly.
    /// - `Store(NoPriceEdit)` in send mode when the price database is not open.
    pub fn build_price(
        &mut self,
        record: &TxRecord,
        asset_parent: AccountId,
        currency: &Commodity,
    ) -> Result<Option<Price>, LedgerError> {
        if self.funds.is_money_market(&record.fund) {
            debug!(fund = %record.fund, "Money market fund, no price recorded");
            return Ok(None);
        }

        let value = parse_price(&record.price)?;
        let account = AccountResolver::find_account(
            &*self.store,
            &record.fund,
            asset_parent,
            &self.accounts.special_locations,
        )?;
        let commodity = self
            .store
            .account(account)
            .ok_or(StoreError::AccountMissing(account))?
            .commodity
            .clone();

        let price = Price::nav(commodity, currency.clone(), record.day(), value);
        if self.mode.commits() {
            self.store.add_price(price.clone())?;
            info!(commodity = %price.commodity, date = %price.date, value = %price.value, "Price added");
        } else {
            debug!(commodity = %price.commodity, date = %price.date, value = %price.value, "Dry run, price discarded");
        }
        Ok(Some(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::record::TradeKind;
    use crate::store::MemoryBook;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn cad() -> Commodity {
        Commodity::currency("CAD")
    }

    fn book() -> (MemoryBook, AccountId) {
        let mut book = MemoryBook::new(cad());
        let root = book.root_account();
        let open = book.ensure_path(root, &["FAMILY", "INVEST", "OPEN"], &cad()).unwrap();
        book.add_account(open, "MFC 856", Commodity::fund("MFC 856")).unwrap();
        book.add_account(open, "MFC 298", Commodity::fund("MFC 298")).unwrap();
        (book, open)
    }

    fn price_line(fund: &str, price: &str) -> TxRecord {
        let date = NaiveDate::from_ymd_opt(2021, 3, 31).unwrap().and_hms_opt(16, 0, 0).unwrap();
        TxRecord::new(date, TradeKind::Purchase, fund).with_price(price)
    }

    #[rstest]
    #[case("$12.3456", dec!(12.3456))]
    #[case("$1,234.5", dec!(1234.5000))]
    #[case(" 9.87 ", dec!(9.8700))]
    fn test_parse_price(#[case] text: &str, #[case] expected: Decimal) {
        let value = parse_price(text).unwrap();
        assert_eq!(value, expected);
        assert_eq!(value.scale(), 4);
    }

    #[rstest]
    #[case("$12.34567")]
    #[case("n/a")]
    #[case("")]
    fn test_parse_price_rejects(#[case] text: &str) {
        assert!(matches!(parse_price(text), Err(LedgerError::Precision(_))));
    }

    #[test]
    fn test_send_mode_adds_pending_price() {
        let (mut book, open) = book();
        let accounts = AccountCatalog::default();
        let funds = FundCatalog::default();
        book.begin_price_edit();

        let price = PriceRecorder::new(&mut book, RunMode::Send, &accounts, &funds)
            .build_price(&price_line("MFC 856", "$10.5000"), open, &cad())
            .unwrap()
            .unwrap();
        assert_eq!(price.commodity, Commodity::fund("MFC 856"));
        assert_eq!(price.date, NaiveDate::from_ymd_opt(2021, 3, 31).unwrap());
        assert_eq!(price.source, "user:price");

        assert_eq!(book.commit_price_edit().unwrap(), 1);
        assert_eq!(book.prices().len(), 1);
    }

    #[test]
    fn test_test_mode_discards_price() {
        let (mut book, open) = book();
        let accounts = AccountCatalog::default();
        let funds = FundCatalog::default();
        book.begin_price_edit();

        let price = PriceRecorder::new(&mut book, RunMode::Test, &accounts, &funds)
            .build_price(&price_line("MFC 856", "$10.5000"), open, &cad())
            .unwrap();
        assert!(price.is_some());
        assert_eq!(book.commit_price_edit().unwrap(), 0);
    }

    #[test]
    fn test_money_market_is_skipped() {
        let (mut book, open) = book();
        let accounts = AccountCatalog::default();
        let funds = FundCatalog {
            money_market: vec!["MFC 298".to_string()],
        };
        let price = PriceRecorder::new(&mut book, RunMode::Send, &accounts, &funds)
            .build_price(&price_line("MFC 298", "$10.0000"), open, &cad())
            .unwrap();
        assert!(price.is_none());
    }

    #[test]
    fn test_send_without_price_edit_fails() {
        let (mut book, open) = book();
        let accounts = AccountCatalog::default();
        let funds = FundCatalog::default();
        let err = PriceRecorder::new(&mut book, RunMode::Send, &accounts, &funds)
            .build_price(&price_line("MFC 856", "$10.5000"), open, &cad())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::NoPriceEdit)));
    }
}
