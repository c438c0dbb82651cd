//! Currency service for price-based conversion.
//!
//! Conversion multiplies by an exchange rate and rounds to the target
//! commodity's fraction with Banker's Rounding.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Currency service for conversion operations.
///
/// Provides methods for converting amounts between commodities using
/// Banker's Rounding (MidpointNearestEven) strategy.
pub struct CurrencyService;

impl CurrencyService {
    /// Convert amount using an exchange rate, rounded to `decimal_places`.
    ///
    /// Uses `RoundingStrategy::MidpointNearestEven` (Banker's Rounding) which:
    /// - Rounds 2.5 → 2 (to nearest even)
    /// - Rounds 3.5 → 4 (to nearest even)
    /// - Rounds 2.25 → 2.2 (to nearest even at 1 decimal)
    ///
    /// Returns `None` when the product overflows.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::currency::CurrencyService;
    ///
    /// let result = CurrencyService::convert(dec!(41.2345), dec!(24.25), 2);
    /// assert_eq!(result, Some(dec!(999.94)));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
        amount
            .checked_mul(rate)
            .map(|v| Self::round(v, decimal_places))
    }

    /// Round a decimal value using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }
}
