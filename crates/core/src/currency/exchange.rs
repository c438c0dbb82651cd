//! Exchange rates derived from the price database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::Commodity;

use super::service::CurrencyService;
use crate::ledger::Price;

/// Exchange rate between two commodities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source commodity.
    pub from: Commodity,
    /// Target commodity.
    pub to: Commodity,
    /// Exchange rate (1 `from` = rate `to`).
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(from: Commodity, to: Commodity, rate: Decimal, effective_date: NaiveDate) -> Self {
        Self {
            from,
            to,
            rate,
            effective_date,
        }
    }

    /// The rate a price implies: one unit of the priced commodity in the price currency.
    #[must_use]
    pub fn from_price(price: &Price) -> Self {
        Self::new(price.commodity.clone(), price.currency.clone(), price.value, price.date)
    }

    /// Converts `amount` of `from` into `to`, rounded to the fraction of `to`.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn apply(&self, amount: Decimal) -> Option<Decimal> {
        CurrencyService::convert(amount, self.rate, self.to.fraction)
    }

    /// Converts `amount` of `to` back into `from` by dividing by the rate,
    /// rounded to the fraction of `from`.
    ///
    /// Returns `None` for a zero rate or on overflow.
    #[must_use]
    pub fn apply_inverse(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_div(self.rate)
            .map(|value| CurrencyService::round(value, self.from.fraction))
    }
}
