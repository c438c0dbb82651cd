//! Period reports.
//!
//! This module buckets ledger splits into caller-supplied periods:
//! - Period buckets and contiguous period sequences
//! - Non-recursive aggregation of one account
//! - Subtree roll-up by account path
//! - The report row shape

pub mod error;
pub mod period;


pub use error::ReportError;
pub use period::{
    PeriodAggregator, PeriodBucket, PeriodRow, period_starts, report_rows, reset_periods,
};
