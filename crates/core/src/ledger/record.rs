//! Source records read from investment statements.
//!
//! A [`TxRecord`] is one trade or price line of a statement, kept exactly as
//! the statement gave it: money in integer cents and units in integer
//! ten-thousandths. An [`InvestmentRecord`] groups the lines of one statement
//! by plan.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::config::AccountCatalog;
use tally_shared::types::commodity::{units_from_raw, value_from_cents};

use super::error::{LedgerError, RecordField};

/// Date format used by statements, e.g. `15-Mar-2021`.
pub const RECORD_DATE_FORMAT: &str = "%d-%b-%Y";

/// Parses a statement date.
///
/// # Errors
///
/// Returns `InvalidRecordType` for the date field if the text does not parse.
pub fn parse_record_date(text: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(text.trim(), RECORD_DATE_FORMAT)
        .map_err(|_| LedgerError::invalid(RecordField::Date, text))
}

/// Statement transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    /// Units switched into a fund.
    #[serde(rename = "Switch-in")]
    SwitchIn,
    /// Units switched out of a fund.
    #[serde(rename = "Switch-out")]
    SwitchOut,
    /// Dollar cost averaging switch into a fund.
    #[serde(rename = "Dollar Cost Averaging Switch-in")]
    DcaIn,
    /// Dollar cost averaging switch out of a fund.
    #[serde(rename = "Dollar Cost Averaging Switch-out")]
    DcaOut,
    /// Internal transfer into a fund.
    #[serde(rename = "Internal Transfer-In")]
    TransferIn,
    /// Internal transfer out of a fund.
    #[serde(rename = "Internal Transfer-Out")]
    TransferOut,
    /// One fund merged into another.
    #[serde(rename = "Fund Merger")]
    FundMerger,
    /// Units sold for cash.
    #[serde(rename = "Redemption")]
    Redemption,
    /// Units bought with cash.
    #[serde(rename = "Purchase")]
    Purchase,
    /// Units redeemed to pay a fee.
    #[serde(rename = "Fee Redemption")]
    FeeRedemption,
    /// Distribution reinvested in the fund.
    #[serde(rename = "Reinvested Distribution")]
    ReinvestedDistribution,
    /// Scheduled withdrawal.
    #[serde(rename = "Automatic/Systematic Withdrawal Plan")]
    SystematicWithdrawal,
    /// Management fee rebate reinvested in the fund.
    #[serde(rename = "Reinvested Management Fee Rebate")]
    ManagementFeeRebate,
    /// Distribution.
    #[serde(rename = "Dist")]
    Distribution,
    /// Cash transferred in.
    #[serde(rename = "In Cash Transfer-in")]
    InCashTransferIn,
    /// Cash transferred out.
    #[serde(rename = "In Cash Transfer-out")]
    InCashTransferOut,
}

impl TradeKind {
    /// Every kind, in statement order.
    pub const ALL: [Self; 16] = [
        Self::SwitchIn,
        Self::SwitchOut,
        Self::DcaIn,
        Self::DcaOut,
        Self::TransferIn,
        Self::TransferOut,
        Self::FundMerger,
        Self::Redemption,
        Self::Purchase,
        Self::FeeRedemption,
        Self::ReinvestedDistribution,
        Self::SystematicWithdrawal,
        Self::ManagementFeeRebate,
        Self::Distribution,
        Self::InCashTransferIn,
        Self::InCashTransferOut,
    ];

    /// The statement token for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SwitchIn => "Switch-in",
            Self::SwitchOut => "Switch-out",
            Self::DcaIn => "Dollar Cost Averaging Switch-in",
            Self::DcaOut => "Dollar Cost Averaging Switch-out",
            Self::TransferIn => "Internal Transfer-In",
            Self::TransferOut => "Internal Transfer-Out",
            Self::FundMerger => "Fund Merger",
            Self::Redemption => "Redemption",
            Self::Purchase => "Purchase",
            Self::FeeRedemption => "Fee Redemption",
            Self::ReinvestedDistribution => "Reinvested Distribution",
            Self::SystematicWithdrawal => "Automatic/Systematic Withdrawal Plan",
            Self::ManagementFeeRebate => "Reinvested Management Fee Rebate",
            Self::Distribution => "Dist",
            Self::InCashTransferIn => "In Cash Transfer-in",
            Self::InCashTransferOut => "In Cash Transfer-out",
        }
    }

    /// Returns true if this kind moves units between two funds and needs a
    /// counterpart record.
    #[must_use]
    pub const fn is_paired(self) -> bool {
        self.counterpart().is_some()
    }

    /// The kind the counterpart record of a paired trade carries.
    #[must_use]
    pub const fn counterpart(self) -> Option<Self> {
        match self {
            Self::SwitchIn => Some(Self::SwitchOut),
            Self::SwitchOut => Some(Self::SwitchIn),
            Self::DcaIn => Some(Self::DcaOut),
            Self::DcaOut => Some(Self::DcaIn),
            Self::TransferIn => Some(Self::TransferOut),
            Self::TransferOut => Some(Self::TransferIn),
            Self::FundMerger => Some(Self::FundMerger),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or_else(|| LedgerError::invalid(RecordField::TradeKind, s))
    }
}

/// Investment plan a statement line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanType {
    /// Unregistered account.
    Open,
    /// Tax-free savings account.
    Tfsa,
    /// Registered retirement savings plan.
    Rrsp,
}

impl PlanType {
    /// Every plan, in statement order.
    pub const ALL: [Self; 3] = [Self::Open, Self::Tfsa, Self::Rrsp];

    /// The statement token for this plan.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Tfsa => "TFSA",
            Self::Rrsp => "RRSP",
        }
    }

    /// Registered plans are held per owner.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Path from the book root to the plan's asset account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecordType` for the owner field if a registered plan's
    /// owner is not in the catalog.
    pub fn asset_path(self, catalog: &AccountCatalog, owner: &str) -> Result<Vec<String>, LedgerError> {
        self.path_from(&catalog.asset_root, catalog, owner)
    }

    /// Path from the book root to the plan's revenue account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecordType` for the owner field if a registered plan's
    /// owner is not in the catalog.
    pub fn revenue_path(self, catalog: &AccountCatalog, owner: &str) -> Result<Vec<String>, LedgerError> {
        self.path_from(&catalog.revenue_root, catalog, owner)
    }

    fn path_from(
        self,
        base: &[String],
        catalog: &AccountCatalog,
        owner: &str,
    ) -> Result<Vec<String>, LedgerError> {
        let mut path = base.to_vec();
        path.push(self.as_str().to_string());
        if self.is_registered() {
            let owner_path = catalog
                .owners
                .get(owner)
                .ok_or_else(|| LedgerError::invalid(RecordField::Owner, owner))?;
            path.extend(owner_path.iter().cloned());
        }
        Ok(path)
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OPEN" => Ok(Self::Open),
            "TFSA" => Ok(Self::Tfsa),
            "RRSP" => Ok(Self::Rrsp),
            _ => Err(LedgerError::invalid(RecordField::Plan, s)),
        }
    }
}

/// Whether a statement line is a trade or a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordClass {
    /// A trade line.
    Trade,
    /// A price line.
    Price,
}

/// One statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Statement date and time.
    pub date: NaiveDateTime,
    /// Transaction type.
    pub kind: TradeKind,
    /// Free text description; defaults to the kind token.
    pub description: String,
    /// Fund name, also the asset account name.
    pub fund: String,
    /// Fund code within the company.
    #[serde(default)]
    pub fund_code: String,
    /// Fund company.
    #[serde(default)]
    pub company: String,
    /// Gross amount in cents.
    pub gross: i64,
    /// Net amount in cents.
    pub net: i64,
    /// Units in ten-thousandths.
    pub units: i64,
    /// Unit price as printed, e.g. `$12.3456`.
    #[serde(default)]
    pub price: String,
    /// Line is part of a switch.
    #[serde(default)]
    pub switch: bool,
    /// Notes.
    #[serde(default)]
    pub notes: String,
}

impl TxRecord {
    /// Creates a record with zero amounts.
    #[must_use]
    pub fn new(date: NaiveDateTime, kind: TradeKind, fund: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            description: kind.as_str().to_string(),
            fund: fund.into(),
            fund_code: String::new(),
            company: String::new(),
            gross: 0,
            net: 0,
            units: 0,
            price: String::new(),
            switch: kind.is_paired(),
            notes: String::new(),
        }
    }

    /// Sets gross and net cents and raw units.
    #[must_use]
    pub fn with_amounts(mut self, gross: i64, net: i64, units: i64) -> Self {
        self.gross = gross;
        self.net = net;
        self.units = units;
        self
    }

    /// Sets the printed unit price.
    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Calendar day of the record.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Gross amount as a two-place decimal.
    ///
    /// # Errors
    ///
    /// Returns `Precision` if the amount cannot be represented.
    pub fn gross_value(&self) -> Result<Decimal, LedgerError> {
        value_from_cents(self.gross).ok_or_else(|| LedgerError::Precision(format!("gross {}", self.gross)))
    }

    /// Net amount as a two-place decimal.
    ///
    /// # Errors
    ///
    /// Returns `Precision` if the amount cannot be represented.
    pub fn net_value(&self) -> Result<Decimal, LedgerError> {
        value_from_cents(self.net).ok_or_else(|| LedgerError::Precision(format!("net {}", self.net)))
    }

    /// Units as a four-place decimal.
    ///
    /// # Errors
    ///
    /// Returns `Precision` if the count cannot be represented.
    pub fn unit_amount(&self) -> Result<Decimal, LedgerError> {
        units_from_raw(self.units).ok_or_else(|| LedgerError::Precision(format!("units {}", self.units)))
    }
}

/// Trades and prices of one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecords {
    /// Trade lines.
    #[serde(rename = "Trade")]
    pub trades: Vec<TxRecord>,
    /// Price lines.
    #[serde(rename = "Price")]
    pub prices: Vec<TxRecord>,
}

/// A trade and, for paired kinds, its counterpart.
pub type TradePair<'a> = (&'a TxRecord, Option<&'a TxRecord>);

/// Outcome of pairing one trade, keyed by its position in the plan.
pub type PairedTrade<'a> = (usize, Result<TradePair<'a>, LedgerError>);

/// All lines of one statement, grouped by plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    /// Statement owner.
    #[serde(rename = "Owner")]
    pub owner: String,
    /// Statement date.
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    /// File the statement was read from.
    #[serde(rename = "Source File")]
    pub source_file: String,
    #[serde(rename = "Plan Data")]
    plans: BTreeMap<PlanType, PlanRecords>,
}

impl InvestmentRecord {
    /// Creates an empty statement with a slot for every plan.
    #[must_use]
    pub fn new(owner: impl Into<String>, date: Option<NaiveDate>, source_file: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            date,
            source_file: source_file.into(),
            plans: PlanType::ALL.into_iter().map(|p| (p, PlanRecords::default())).collect(),
        }
    }

    /// Appends a line to a plan.
    pub fn add(&mut self, plan: PlanType, class: RecordClass, record: TxRecord) {
        let records = self.plans.entry(plan).or_default();
        match class {
            RecordClass::Trade => records.trades.push(record),
            RecordClass::Price => records.prices.push(record),
        }
    }

    /// Trade lines of a plan.
    #[must_use]
    pub fn trades(&self, plan: PlanType) -> &[TxRecord] {
        self.plans.get(&plan).map(|r| r.trades.as_slice()).unwrap_or_default()
    }

    /// Price lines of a plan.
    #[must_use]
    pub fn prices(&self, plan: PlanType) -> &[TxRecord] {
        self.plans.get(&plan).map(|r| r.prices.as_slice()).unwrap_or_default()
    }

    /// Number of lines, optionally narrowed to one plan and one class.
    #[must_use]
    pub fn size(&self, plan: Option<PlanType>, class: Option<RecordClass>) -> usize {
        let plans: Vec<PlanType> = plan.map_or_else(|| PlanType::ALL.to_vec(), |p| vec![p]);
        plans
            .into_iter()
            .map(|p| match class {
                Some(RecordClass::Trade) => self.trades(p).len(),
                Some(RecordClass::Price) => self.prices(p).len(),
                None => self.trades(p).len() + self.prices(p).len(),
            })
            .sum()
    }

    /// `P{prices}/T{trades}` for one plan.
    #[must_use]
    pub fn plan_summary(&self, plan: PlanType) -> String {
        format!(
            "P{}/T{}",
            self.size(Some(plan), Some(RecordClass::Price)),
            self.size(Some(plan), Some(RecordClass::Trade))
        )
    }

    /// Total count followed by each plan's summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let plans: Vec<String> = PlanType::ALL
            .into_iter()
            .map(|p| format!("{p}:{}", self.plan_summary(p)))
            .collect();
        format!("{} = {}", self.size(None, None), plans.join(" + "))
    }

    /// Pretty-printed JSON export.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Matches each paired trade of a plan with its counterpart: same day,
    /// complementary kind, opposite unit sign. Other trades are returned alone.
    /// A paired trade with no match yields `MissingCounterpart` at its own
    /// position; the remaining trades are still paired.
    #[must_use]
    pub fn pair_trades(&self, plan: PlanType) -> Vec<PairedTrade<'_>> {
        let trades = self.trades(plan);
        let mut used = vec![false; trades.len()];
        let mut pairs = Vec::new();

        for (i, trade) in trades.iter().enumerate() {
            if used[i] {
                continue;
            }
            used[i] = true;

            let Some(wanted) = trade.kind.counterpart() else {
                pairs.push((i, Ok((trade, None))));
                continue;
            };

            let found = (0..trades.len()).find(|&j| {
                let other = &trades[j];
                !used[j]
                    && other.kind == wanted
                    && other.day() == trade.day()
                    && other.units.signum() == -trade.units.signum()
            });
            match found {
                Some(j) => {
                    used[j] = true;
                    pairs.push((i, Ok((trade, Some(&trades[j])))));
                }
                None => {
                    let error = LedgerError::MissingCounterpart(format!(
                        "{} {} on {}",
                        trade.kind,
                        trade.fund,
                        trade.day()
                    ));
                    pairs.push((i, Err(error)));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[rstest]
    #[case("Switch-in", TradeKind::SwitchIn)]
    #[case("Dollar Cost Averaging Switch-out", TradeKind::DcaOut)]
    #[case("Internal Transfer-In", TradeKind::TransferIn)]
    #[case("Fund Merger", TradeKind::FundMerger)]
    #[case("Automatic/Systematic Withdrawal Plan", TradeKind::SystematicWithdrawal)]
    #[case(" Dist ", TradeKind::Distribution)]
    fn test_trade_kind_tokens(#[case] token: &str, #[case] expected: TradeKind) {
        assert_eq!(token.parse::<TradeKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_trade_kind() {
        let err = "Inter-Class Switch".parse::<TradeKind>().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidRecordType { field: RecordField::TradeKind, .. }
        ));
    }

    #[test]
    fn test_kind_tokens_round_trip() {
        for kind in TradeKind::ALL {
            assert_eq!(kind.as_str().parse::<TradeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_paired_kinds() {
        let paired: Vec<TradeKind> = TradeKind::ALL.into_iter().filter(|k| k.is_paired()).collect();
        assert_eq!(paired.len(), 7);
        assert_eq!(TradeKind::FundMerger.counterpart(), Some(TradeKind::FundMerger));
        assert!(!TradeKind::Redemption.is_paired());
    }

    #[rstest]
    #[case("OPEN", PlanType::Open)]
    #[case("TFSA", PlanType::Tfsa)]
    #[case("RRSP", PlanType::Rrsp)]
    fn test_plan_tokens(#[case] token: &str, #[case] expected: PlanType) {
        assert_eq!(token.parse::<PlanType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_plan() {
        let err = "RESP".parse::<PlanType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid plan: 'RESP'");
    }

    #[test]
    fn test_plan_paths() {
        let mut catalog = AccountCatalog::default();
        catalog.owners.insert("Mark".to_string(), vec!["Mark".to_string()]);

        assert_eq!(
            PlanType::Open.asset_path(&catalog, "anyone").unwrap(),
            vec!["FAMILY", "INVEST", "OPEN"]
        );
        assert_eq!(
            PlanType::Rrsp.revenue_path(&catalog, "Mark").unwrap(),
            vec!["REV_Invest", "Dist", "RRSP", "Mark"]
        );
        let err = PlanType::Tfsa.asset_path(&catalog, "Nobody").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidRecordType { field: RecordField::Owner, .. }
        ));
    }

    #[test]
    fn test_scaled_amounts() {
        let record = TxRecord::new(at(2021, 3, 15), TradeKind::Redemption, "MFC 856")
            .with_amounts(100_000, 97_500, -412_345);
        assert_eq!(record.gross_value().unwrap().to_string(), "1000.00");
        assert_eq!(record.net_value().unwrap().to_string(), "975.00");
        assert_eq!(record.unit_amount().unwrap().to_string(), "-41.2345");
    }

    #[test]
    fn test_parse_record_date() {
        assert_eq!(
            parse_record_date("15-Mar-2021").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()
        );
        assert!(matches!(
            parse_record_date("2021-03-15"),
            Err(LedgerError::InvalidRecordType { field: RecordField::Date, .. })
        ));
    }

    #[test]
    fn test_statement_sizes() {
        let mut statement = InvestmentRecord::new("Mark", None, "statement.pdf");
        let day = at(2021, 3, 15);
        statement.add(PlanType::Open, RecordClass::Trade, TxRecord::new(day, TradeKind::Purchase, "A"));
        statement.add(PlanType::Open, RecordClass::Price, TxRecord::new(day, TradeKind::Purchase, "A"));
        statement.add(PlanType::Rrsp, RecordClass::Price, TxRecord::new(day, TradeKind::Purchase, "B"));

        assert_eq!(statement.size(None, None), 3);
        assert_eq!(statement.size(None, Some(RecordClass::Price)), 2);
        assert_eq!(statement.plan_summary(PlanType::Open), "P1/T1");
        assert_eq!(statement.summary(), "3 = OPEN:P1/T1 + TFSA:P0/T0 + RRSP:P1/T0");
        assert!(statement.to_json().unwrap().contains("\"Plan Data\""));
    }

    #[test]
    fn test_pair_trades() {
        let day = at(2021, 3, 15);
        let mut statement = InvestmentRecord::new("Mark", None, "");
        statement.add(
            PlanType::Open,
            RecordClass::Trade,
            TxRecord::new(day, TradeKind::SwitchIn, "TML 674").with_amounts(120_000, 120_000, 5_000_000),
        );
        statement.add(
            PlanType::Open,
            RecordClass::Trade,
            TxRecord::new(day, TradeKind::Distribution, "MFC 856").with_amounts(1_000, 1_000, 10_000),
        );
        statement.add(
            PlanType::Open,
            RecordClass::Trade,
            TxRecord::new(day, TradeKind::SwitchOut, "MFC 856").with_amounts(-120_000, -120_000, -5_000_000),
        );

        let pairs = statement.pair_trades(PlanType::Open);
        assert_eq!(pairs.len(), 2);
        let (index, pair) = &pairs[0];
        let (tx1, tx2) = pair.as_ref().unwrap();
        assert_eq!(*index, 0);
        assert_eq!(tx1.kind, TradeKind::SwitchIn);
        assert_eq!(tx2.map(|r| r.kind), Some(TradeKind::SwitchOut));
        let (index, pair) = &pairs[1];
        assert_eq!(*index, 1);
        assert!(pair.as_ref().unwrap().1.is_none());
    }

    #[test]
    fn test_pair_trades_missing_counterpart() {
        let mut statement = InvestmentRecord::new("Mark", None, "");
        statement.add(
            PlanType::Tfsa,
            RecordClass::Trade,
            TxRecord::new(at(2021, 3, 15), TradeKind::DcaIn, "TML 674").with_amounts(1, 1, 1),
        );
        statement.add(
            PlanType::Tfsa,
            RecordClass::Trade,
            TxRecord::new(at(2021, 3, 16), TradeKind::Purchase, "MFC 856").with_amounts(2, 2, 2),
        );

        let pairs = statement.pair_trades(PlanType::Tfsa);
        assert_eq!(pairs.len(), 2);
        assert!(matches!(pairs[0], (0, Err(LedgerError::MissingCounterpart(_)))));
        assert!(matches!(pairs[1], (1, Ok((_, None)))));
    }
}
