//! Commodities and exact scaled quantities.
//!
//! CRITICAL: Never use floating-point for money or unit calculations.
//! Source records carry integer counts of the smallest unit (cents, ten-thousandths
//! of a fund unit); they are turned into `rust_decimal::Decimal` here.

use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Namespace used for ISO 4217 currencies.
pub const CURRENCY_NAMESPACE: &str = "ISO4217";

/// Namespace used for mutual fund units.
pub const FUND_NAMESPACE: &str = "FUND";

/// Scale of monetary values in source records (cents).
pub const VALUE_SCALE: u32 = 2;

/// Scale of unit counts in source records (ten-thousandths of a unit).
pub const UNITS_SCALE: u32 = 4;

/// A currency or tradable unit denomination attached to an account or price.
///
/// Two commodities are equal when namespace and mnemonic match; `fraction`
/// only describes how finely the commodity is divided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    /// Namespace, e.g. `ISO4217` or `FUND`.
    pub namespace: String,
    /// Symbol within the namespace, e.g. `CAD`.
    pub mnemonic: String,
    /// Decimal places of the smallest unit.
    pub fraction: u32,
}

impl Commodity {
    /// Creates a new commodity.
    #[must_use]
    pub fn new(namespace: impl Into<String>, mnemonic: impl Into<String>, fraction: u32) -> Self {
        Self {
            namespace: namespace.into(),
            mnemonic: mnemonic.into(),
            fraction,
        }
    }

    /// Creates an ISO 4217 currency with two decimal places.
    #[must_use]
    pub fn currency(code: &str) -> Self {
        Self::new(CURRENCY_NAMESPACE, code.to_uppercase(), VALUE_SCALE)
    }

    /// Creates a fund unit commodity with four decimal places.
    #[must_use]
    pub fn fund(name: impl Into<String>) -> Self {
        Self::new(FUND_NAMESPACE, name, UNITS_SCALE)
    }

    /// Returns true if this is an ISO 4217 currency.
    #[must_use]
    pub fn is_currency(&self) -> bool {
        self.namespace == CURRENCY_NAMESPACE
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.mnemonic == other.mnemonic
    }
}

impl Eq for Commodity {}

impl Hash for Commodity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.mnemonic.hash(state);
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.mnemonic)
    }
}

/// Builds an exact decimal from an integer count of `10^-scale` units.
///
/// Returns `None` when the scale is outside what `Decimal` can represent.
#[must_use]
pub fn scaled(raw: i64, scale: u32) -> Option<Decimal> {
    Decimal::try_new(raw, scale).ok()
}

/// Monetary value from integer cents.
#[must_use]
pub fn value_from_cents(cents: i64) -> Option<Decimal> {
    scaled(cents, VALUE_SCALE)
}

/// Unit amount from integer ten-thousandths.
#[must_use]
pub fn units_from_raw(raw: i64) -> Option<Decimal> {
    scaled(raw, UNITS_SCALE)
}

#[cfg(test)]
#[path = "commodity_tests.rs"]
mod tests;
