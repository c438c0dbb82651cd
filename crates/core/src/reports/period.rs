//! Period aggregation of ledger splits.
//!
//! Splits are assigned to the latest period whose start is on or before the
//! transaction date. A date equal to a period start belongs to that period.
//! Splits dated before the first period, after the last period's end, or in
//! a gap between two periods are not counted.
//!
//! Aggregation accumulates into the caller's buckets and never clears them;
//! [`reset_periods`] starts a fresh report.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, PeriodSpan};
use tracing::debug;

use super::error::ReportError;
use crate::ledger::{AccountResolver, LedgerError};
use crate::store::{LedgerStore, StoreError};

/// Running debit, credit and total sums over one inclusive date range.
///
/// `credit` holds the magnitude of negative values, so
/// `total == debit - credit` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period, inclusive.
    pub end: NaiveDate,
    /// Sum of non-negative split values.
    pub debit: Decimal,
    /// Sum of the magnitudes of negative split values.
    pub credit: Decimal,
    /// Sum of all split values.
    pub total: Decimal,
}

impl PeriodBucket {
    /// Creates an empty bucket.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// `count` contiguous periods of `span`, the first starting on `first_start`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriods` if a period would fall outside the calendar.
    pub fn sequence(first_start: NaiveDate, span: PeriodSpan, count: u32) -> Result<Vec<Self>, ReportError> {
        let offset = |n: u32| {
            n.checked_mul(span.months())
                .and_then(|months| first_start.checked_add_months(Months::new(months)))
        };
        (0..count)
            .map(|i| {
                let start = offset(i);
                let end = i.checked_add(1).and_then(offset).and_then(|next| next.pred_opt());
                match (start, end) {
                    (Some(start), Some(end)) => Ok(Self::new(start, end)),
                    _ => Err(ReportError::invalid(format!("period {i} after {first_start} is out of range"))),
                }
            })
            .collect()
    }

    /// Returns true if `date` falls within the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clears all sums.
    pub fn reset(&mut self) {
        self.debit = Decimal::ZERO;
        self.credit = Decimal::ZERO;
        self.total = Decimal::ZERO;
    }

    fn accumulate(&mut self, value: Decimal) -> Result<(), StoreError> {
        let overflow = || StoreError::Overflow("accumulating period sums");
        if value.is_sign_negative() {
            self.credit = self.credit.checked_sub(value).ok_or_else(overflow)?;
        } else {
            self.debit = self.debit.checked_add(value).ok_or_else(overflow)?;
        }
        self.total = self.total.checked_add(value).ok_or_else(overflow)?;
        Ok(())
    }
}

/// One line of the period report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRow {
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Debit sum.
    pub debit_sum: Decimal,
    /// Credit sum.
    pub credit_sum: Decimal,
    /// Total.
    pub total: Decimal,
}

impl From<&PeriodBucket> for PeriodRow {
    fn from(bucket: &PeriodBucket) -> Self {
        Self {
            period_start: bucket.start,
            period_end: bucket.end,
            debit_sum: bucket.debit,
            credit_sum: bucket.credit,
            total: bucket.total,
        }
    }
}

/// Clears every bucket.
pub fn reset_periods(periods: &mut [PeriodBucket]) {
    periods.iter_mut().for_each(PeriodBucket::reset);
}

/// Start dates of `periods`, in order.
#[must_use]
pub fn period_starts(periods: &[PeriodBucket]) -> Vec<NaiveDate> {
    periods.iter().map(|p| p.start).collect()
}

/// The report shape: one row per period, in input order.
#[must_use]
pub fn report_rows(periods: &[PeriodBucket]) -> Vec<PeriodRow> {
    periods.iter().map(PeriodRow::from).collect()
}

/// Buckets ledger splits into periods.
pub struct PeriodAggregator;

impl PeriodAggregator {
    /// Checks that `period_starts` matches `periods` and that the periods are
    /// sorted and do not overlap.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriods` describing the first problem found.
    pub fn validate(period_starts: &[NaiveDate], periods: &[PeriodBucket]) -> Result<(), ReportError> {
        if period_starts.len() != periods.len() {
            return Err(ReportError::invalid(format!(
                "{} start dates for {} periods",
                period_starts.len(),
                periods.len()
            )));
        }
        for (i, (start, period)) in period_starts.iter().zip(periods).enumerate() {
            if *start != period.start {
                return Err(ReportError::invalid(format!(
                    "start date {start} does not match period {i} starting {}",
                    period.start
                )));
            }
            if period.start > period.end {
                return Err(ReportError::invalid(format!(
                    "period {i} ends {} before it starts {}",
                    period.end, period.start
                )));
            }
        }
        if let Some(i) = periods.windows(2).position(|w| w[1].start <= w[0].end) {
            return Err(ReportError::invalid(format!(
                "period {} overlaps or precedes period {i}",
                i + 1
            )));
        }
        Ok(())
    }

    /// Adds every split of `account` (not its descendants) to the period its
    /// transaction date falls in. Returns the number of splits counted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriods` for unusable periods, or a ledger error if a
    /// split's transaction cannot be read.
    pub fn aggregate<S>(
        store: &S,
        account: AccountId,
        period_starts: &[NaiveDate],
        periods: &mut [PeriodBucket],
    ) -> Result<usize, ReportError>
    where
        S: LedgerStore + ?Sized,
    {
        Self::validate(period_starts, periods)?;
        let Some(last_end) = periods.last().map(|p| p.end) else {
            return Ok(0);
        };

        let mut accepted = 0;
        for split in store.splits(account) {
            let tx = store.transaction(split.transaction_id).ok_or_else(|| {
                LedgerError::from(StoreError::corrupt(format!(
                    "split {} has no transaction",
                    split.id
                )))
            })?;

            if tx.date > last_end {
                continue;
            }
            // Latest period starting on or before the date.
            let Some(index) = period_starts.partition_point(|s| *s <= tx.date).checked_sub(1) else {
                continue;
            };
            let bucket = &mut periods[index];
            if tx.date > bucket.end {
                continue;
            }

            bucket.accumulate(split.value).map_err(LedgerError::from)?;
            accepted += 1;
        }

        debug!(account_id = %account, accepted, "Aggregated account splits");
        Ok(accepted)
    }

    /// Resolves `path` below `base` and aggregates that account and every
    /// descendant into the same buckets. Returns the account's name.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the path does not resolve, or any error
    /// from [`Self::aggregate`].
    pub fn fill_splits<S, P>(
        store: &S,
        base: AccountId,
        path: &[P],
        period_starts: &[NaiveDate],
        periods: &mut [PeriodBucket],
    ) -> Result<String, ReportError>
    where
        S: LedgerStore + ?Sized,
        P: AsRef<str>,
    {
        let account = AccountResolver::resolve(store, base, path)?;
        let name = store
            .account(account)
            .ok_or_else(|| LedgerError::from(StoreError::AccountMissing(account)))?
            .name
            .clone();

        let mut accepted = Self::aggregate(store, account, period_starts, periods)?;
        for descendant in store.descendants(account) {
            accepted += Self::aggregate(store, descendant, period_starts, periods)?;
        }

        debug!(account = %name, accepted, "Filled period splits for subtree");
        Ok(name)
    }
}
