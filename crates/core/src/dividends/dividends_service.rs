use async_trait::async_trait;
use log::{debug, error};
use std::sync::Arc;

use super::dividends_model::{DividendSummary, PaymentDatePolicy, ProvisionedDividend};
use super::dividends_traits::DividendRepositoryTrait;
use super::refresh_worker::RefreshHandle;
use crate::errors::Result;
use crate::ledger::ledger_traits::TransactionRepositoryTrait;
use crate::positions::positions_model::is_quantity_significant;
use crate::positions::positions_traits::PositionRepositoryTrait;
use crate::utils::time_utils;

#[async_trait]
pub trait DividendServiceTrait: Send + Sync {
    /// Reconciles cached dividend events against the account's holdings.
    ///
    /// Income earned before a holding's acquisition date is never counted.
    /// A failure on one symbol degrades to "no history for this symbol";
    /// the call never aborts wholesale.
    async fn reconcile(&self, account_id: &str) -> Result<DividendSummary>;
}

pub struct DividendService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
    /// Cache-warming side channel; absent in contexts (tests, one-shot
    /// tools) that have no worker running.
    refresh_handle: Option<RefreshHandle>,
    payment_policy: PaymentDatePolicy,
}

impl DividendService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
        refresh_handle: Option<RefreshHandle>,
        payment_policy: PaymentDatePolicy,
    ) -> Self {
        Self {
            position_repository,
            transaction_repository,
            dividend_repository,
            refresh_handle,
            payment_policy,
        }
    }
}

#[async_trait]
impl DividendServiceTrait for DividendService {
    async fn reconcile(&self, account_id: &str) -> Result<DividendSummary> {
        let positions = self.position_repository.list_positions(account_id)?;
        let today = time_utils::today();
        let mut summary = DividendSummary::default();

        for position in positions {
            if !position.kind.pays_dividends() {
                continue;
            }
            if !is_quantity_significant(&position.quantity) {
                continue;
            }

            // The first buy gates eligibility; a position without ledger
            // history (imported holdings) falls back to its creation date.
            let acquisition_date = match self
                .transaction_repository
                .get_first_buy_date(account_id, &position.symbol)
            {
                Ok(Some(date)) => date,
                Ok(None) => position.created_at.date(),
                Err(e) => {
                    error!(
                        "Could not resolve acquisition date for {}: {}. Using position creation date.",
                        position.symbol, e
                    );
                    position.created_at.date()
                }
            };

            let events = match self.dividend_repository.get_events(&position.symbol) {
                Ok(events) => events,
                Err(e) => {
                    // Per-symbol isolation: degrade to "no history".
                    error!(
                        "Dividend history unavailable for {}: {}. Skipping symbol.",
                        position.symbol, e
                    );
                    continue;
                }
            };

            if events.is_empty() {
                if let Some(handle) = &self.refresh_handle {
                    handle.request_refresh(&position.symbol);
                }
                continue;
            }

            for event in events {
                if event.ex_date < acquisition_date {
                    // Not yet a holder on the ex-date: no credit.
                    continue;
                }
                let amount = position.quantity * event.amount_per_share;
                let payment_date = self.payment_policy.effective_payment_date(&event);

                if payment_date > today {
                    summary.provisioned.push(ProvisionedDividend {
                        symbol: position.symbol.clone(),
                        ex_date: event.ex_date,
                        payment_date,
                        amount,
                    });
                } else {
                    summary.add_received(
                        time_utils::month_key(payment_date),
                        &position.symbol,
                        amount,
                    );
                }
            }
        }

        summary
            .provisioned
            .sort_by(|a, b| a.payment_date.cmp(&b.payment_date));

        debug!(
            "Reconciled dividends for {}: {} months, {} provisioned, total {}",
            account_id,
            summary.by_month.len(),
            summary.provisioned.len(),
            summary.total_all_time
        );
        Ok(summary)
    }
}
