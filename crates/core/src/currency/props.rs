//! Property-based tests for currency conversion.
//!
//! - Banker's Rounding Correctness
//! - Inverse rate consistency

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::CurrencyService;

/// Strategy to generate signed unit amounts (-100,000.0000 to 100,000.0000).
fn unit_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate positive prices (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate decimal places (0 to 4).
fn decimal_places() -> impl Strategy<Value = u32> {
    0u32..=4
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conversion result never carries more decimals than requested.
    #[test]
    fn prop_convert_respects_fraction(
        amount in unit_amount(),
        rate in positive_rate(),
        places in decimal_places(),
    ) {
        let result = CurrencyService::convert(amount, rate, places).unwrap();
        prop_assert!(result.scale() <= places, "{} has more than {} places", result, places);
    }

    /// Rounding is deterministic.
    #[test]
    fn prop_convert_is_deterministic(
        amount in unit_amount(),
        rate in positive_rate(),
    ) {
        let first = CurrencyService::convert(amount, rate, 2);
        let second = CurrencyService::convert(amount, rate, 2);
        prop_assert_eq!(first, second);
    }

    /// Conversion preserves sign for positive rates.
    #[test]
    fn prop_convert_preserves_sign(
        amount in unit_amount(),
        rate in positive_rate(),
    ) {
        let result = CurrencyService::convert(amount, rate, 4).unwrap();
        if amount > Decimal::ZERO {
            prop_assert!(result >= Decimal::ZERO);
        } else {
            prop_assert!(result <= Decimal::ZERO);
        }
    }

    /// A rate of one only rounds.
    #[test]
    fn prop_unit_rate_preserves_amount(
        amount in unit_amount(),
        places in decimal_places(),
    ) {
        let result = CurrencyService::convert(amount, Decimal::ONE, places).unwrap();
        prop_assert_eq!(result, CurrencyService::round(amount, places));
    }
}
