//! Balanced trade transactions from statement records.
//!
//! Every statement trade becomes one transaction whose split values net to
//! exactly zero. The split topology depends only on the trade kind:
//!
//! - paired kinds (switches, transfers, mergers) move value between two fund
//!   accounts, one split per record;
//! - redemptions and purchases settle against the holding account, with any
//!   difference between gross and net charged to financial services;
//! - everything else books the gross amount against the plan's revenue
//!   account.
//!
//! A transaction that does not balance is rolled back and never reaches the
//! store.

use tally_shared::config::AccountCatalog;
use tally_shared::types::{AccountId, Commodity, RunMode};
use tracing::{error, info};

use super::error::LedgerError;
use super::record::{TradeKind, TxRecord};
use super::resolver::AccountResolver;
use super::split::{ReconcileState, Split, SplitAction};
use super::transaction::Transaction;
use super::types::{Disposition, TradeContext, TradeOutcome};
use crate::store::LedgerStore;

/// Which way a redemption or purchase moves units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingSide {
    /// Units sold into the holding account.
    Sell,
    /// Units bought from the holding account.
    Buy,
}

impl HoldingSide {
    fn action(self) -> SplitAction {
        match self {
            Self::Sell => SplitAction::Sell,
            Self::Buy => SplitAction::Buy,
        }
    }
}

/// Split topology chosen for a trade.
#[derive(Debug, Clone, Copy)]
pub enum TradePlan<'a> {
    /// Units move between two funds.
    Paired {
        /// Record the transaction is dated and described by.
        primary: &'a TxRecord,
        /// The other side of the move.
        counter: &'a TxRecord,
    },
    /// Units settle against the holding account.
    Holding {
        /// The trade.
        record: &'a TxRecord,
        /// Buy or sell.
        side: HoldingSide,
    },
    /// Gross amount is booked to a revenue account.
    Revenue {
        /// The trade.
        record: &'a TxRecord,
        /// Account receiving the offsetting split.
        revenue_account: AccountId,
    },
}

impl<'a> TradePlan<'a> {
    /// Chooses the plan for `tx1`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCounterpart` for a paired kind without `tx2`.
    pub fn classify(
        tx1: &'a TxRecord,
        tx2: Option<&'a TxRecord>,
        ctx: &TradeContext,
    ) -> Result<Self, LedgerError> {
        match tx1.kind {
            TradeKind::SwitchIn
            | TradeKind::SwitchOut
            | TradeKind::DcaIn
            | TradeKind::DcaOut
            | TradeKind::TransferIn
            | TradeKind::TransferOut
            | TradeKind::FundMerger => {
                let counter = tx2.ok_or_else(|| {
                    LedgerError::MissingCounterpart(format!("{} {}", tx1.kind, tx1.fund))
                })?;
                Ok(Self::Paired { primary: tx1, counter })
            }
            TradeKind::Redemption => Ok(Self::Holding {
                record: tx1,
                side: HoldingSide::Sell,
            }),
            TradeKind::Purchase => Ok(Self::Holding {
                record: tx1,
                side: HoldingSide::Buy,
            }),
            TradeKind::FeeRedemption
            | TradeKind::ReinvestedDistribution
            | TradeKind::SystematicWithdrawal
            | TradeKind::ManagementFeeRebate
            | TradeKind::Distribution
            | TradeKind::InCashTransferIn
            | TradeKind::InCashTransferOut => Ok(Self::Revenue {
                record: tx1,
                revenue_account: ctx.revenue_account,
            }),
        }
    }
}

/// Builds and submits trade transactions against an open store.
pub struct TransactionBuilder<'a, S: LedgerStore + ?Sized> {
    store: &'a mut S,
    currency: &'a Commodity,
    mode: RunMode,
    catalog: &'a AccountCatalog,
}

impl<'a, S: LedgerStore + ?Sized> TransactionBuilder<'a, S> {
    /// Creates a builder writing `currency` transactions to `store`.
    pub fn new(store: &'a mut S, currency: &'a Commodity, mode: RunMode, catalog: &'a AccountCatalog) -> Self {
        Self {
            store,
            currency,
            mode,
            catalog,
        }
    }

    /// Drafts and submits the transaction for one trade.
    ///
    /// # Errors
    ///
    /// See [`Self::draft_trade`] and [`Self::submit`].
    pub fn build_trade(
        &mut self,
        tx1: &TxRecord,
        tx2: Option<&TxRecord>,
        ctx: &TradeContext,
    ) -> Result<TradeOutcome, LedgerError> {
        let draft = self.draft_trade(tx1, tx2, ctx)?;
        self.submit(draft)
    }

    /// Builds the draft transaction for one trade without submitting it.
    ///
    /// # Errors
    ///
    /// - `MissingCounterpart` for a paired trade without `tx2`.
    /// - `AccountNotFound` if a fund, holding or financial-services account is missing.
    /// - `Precision` if an amount cannot be represented exactly.
    pub fn draft_trade(
        &self,
        tx1: &TxRecord,
        tx2: Option<&TxRecord>,
        ctx: &TradeContext,
    ) -> Result<Transaction, LedgerError> {
        let plan = TradePlan::classify(tx1, tx2, ctx)?;
        let mut tx = Transaction::draft(self.currency.clone(), tx1.day(), tx1.description.clone());
        let asset = self.asset_split(tx1, ctx)?;

        match plan {
            TradePlan::Paired { primary, counter } => {
                let counter_split = self.asset_split(counter, ctx)?;
                tx.description = format!("{} <> {}", primary.description, counter.fund);
                tx.notes = format!("{} | {}", primary.notes, counter.notes);
                tx.add_split(Self::paired_leg(asset, primary)?);
                tx.add_split(Self::paired_leg(counter_split, counter)?);
            }
            TradePlan::Holding { record, side } => {
                let gross = record.gross_value()?;
                let net = record.net_value()?;
                tx.notes = if record.notes.is_empty() {
                    record.fund.clone()
                } else {
                    format!("{}: {}", record.kind, record.notes)
                };

                tx.add_split(asset.with_action(side.action()));
                let holding = self.root_account(&self.catalog.holding)?;
                tx.add_split(Split::currency_leg(holding, -net));

                if gross != net {
                    let fees = net
                        .checked_sub(gross)
                        .ok_or_else(|| LedgerError::Precision(format!("{net} - {gross}")))?;
                    let fin_services = self.root_account(&self.catalog.fin_services)?;
                    tx.add_split(Split::currency_leg(fin_services, fees));
                }
            }
            TradePlan::Revenue { record, revenue_account } => {
                let gross = record.gross_value()?;
                let action = if record.description.contains("Fee") {
                    SplitAction::Fee
                } else if record.units < 0 {
                    SplitAction::Sell
                } else {
                    SplitAction::Dist
                };
                tx.notes = record.notes.clone();

                tx.add_split(asset.with_action(action));
                tx.add_split(
                    Split::currency_leg(revenue_account, -gross).with_reconcile(ReconcileState::Cleared),
                );
            }
        }

        Ok(tx)
    }

    /// Checks the zero-sum rule and commits or discards the draft.
    ///
    /// A balanced draft is committed in send mode and discarded in test mode.
    ///
    /// # Errors
    ///
    /// Returns `Imbalance` with the residual if the split values do not net
    /// to zero; the draft is rolled back and nothing reaches the store.
    pub fn submit(&mut self, draft: Transaction) -> Result<TradeOutcome, LedgerError> {
        let residual = draft.imbalance();
        if !residual.is_zero() {
            let currency = draft.currency.clone();
            error!(
                transaction_id = %draft.id,
                description = %draft.description,
                %residual,
                "Transaction does not balance, rolling back"
            );
            draft.rollback();
            return Err(LedgerError::Imbalance { residual, currency });
        }

        let mut transaction = draft.clone();
        if !self.mode.commits() {
            draft.rollback();
            info!(transaction_id = %transaction.id, description = %transaction.description, "Dry run, transaction discarded");
            return Ok(TradeOutcome {
                transaction,
                disposition: Disposition::Discarded,
            });
        }

        self.store.commit_transaction(draft)?;
        transaction.mark_committed();
        info!(
            transaction_id = %transaction.id,
            description = %transaction.description,
            splits = transaction.splits.len(),
            "Transaction committed"
        );
        Ok(TradeOutcome {
            transaction,
            disposition: Disposition::Committed,
        })
    }

    fn asset_split(&self, record: &TxRecord, ctx: &TradeContext) -> Result<Split, LedgerError> {
        let account = AccountResolver::find_account(
            &*self.store,
            &record.fund,
            ctx.asset_parent,
            &self.catalog.special_locations,
        )?;
        Ok(Split::new(account, record.gross_value()?, record.unit_amount()?))
    }

    fn paired_leg(split: Split, record: &TxRecord) -> Result<Split, LedgerError> {
        let split = split.with_action(SplitAction::from_units(record.unit_amount()?));
        Ok(if record.notes.is_empty() {
            split
        } else {
            split.with_memo(record.notes.clone())
        })
    }

    fn root_account(&self, name: &str) -> Result<AccountId, LedgerError> {
        AccountResolver::resolve(&*self.store, self.store.root_account(), &[name])
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
