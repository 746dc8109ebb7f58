//! One cycle of the order status reconciliation loop.
//!
//! A cycle reads every non-terminal order, asks the accrual service about each one, and writes every status change it
//! learned about in a single atomic batch. The scheduling of cycles is the caller's business.
use std::{fmt::Debug, time::Duration};

use futures_util::{stream, StreamExt};
use log::*;
use tokio::time::{timeout_at, Instant};

use crate::{
    db_types::{OrderNumber, OrderStatusType, StatusUpdate},
    traits::{
        AccrualLookup,
        AccrualReport,
        LookupOutcome,
        LoyaltyGatewayDatabase,
        LoyaltyGatewayError,
        ReconciliationResult,
    },
};

pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONCURRENCY: usize = 1;

pub struct ReconciliationApi<B, C> {
    db: B,
    client: C,
    cycle_timeout: Duration,
    concurrency: usize,
}

impl<B, C> Debug for ReconciliationApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi (timeout: {:?}, concurrency: {})", self.cycle_timeout, self.concurrency)
    }
}

impl<B, C> ReconciliationApi<B, C> {
    pub fn new(db: B, client: C) -> Self {
        Self { db, client, cycle_timeout: DEFAULT_CYCLE_TIMEOUT, concurrency: DEFAULT_CONCURRENCY }
    }

    /// Sets the time budget for a single cycle. Lookups still in flight when it runs out are abandoned.
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    /// Sets the maximum number of accrual lookups in flight at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl<B, C> ReconciliationApi<B, C>
where
    B: LoyaltyGatewayDatabase,
    C: AccrualLookup,
{
    /// Runs a single reconciliation cycle.
    ///
    /// * Lookup failures, unknown orders and unexpected responses are logged and skipped. They are retried next cycle.
    /// * A rate-limit response stops the cycle. No further lookups are made.
    /// * When the cycle deadline passes, the lookup in flight is abandoned.
    ///
    /// In every case, the changes collected so far are written in one batch. An empty batch is not written.
    /// Lookup results are consumed in the order the backend returned the pending orders.
    pub async fn run_cycle(&self) -> Result<ReconciliationResult, LoyaltyGatewayError> {
        let deadline = Instant::now() + self.cycle_timeout;
        let mut result = ReconciliationResult::default();
        let pending = match timeout_at(deadline, self.db.orders_pending_reconciliation()).await {
            Ok(pending) => pending?,
            Err(_) => {
                warn!("🔄️ Timed out fetching the orders pending reconciliation");
                result.timed_out = true;
                return Ok(result);
            },
        };
        result.pending = pending.len();
        if pending.is_empty() {
            trace!("🔄️ No orders are pending reconciliation");
            return Ok(result);
        }
        debug!("🔄️ {} orders are pending reconciliation", pending.len());

        let client = &self.client;
        let mut lookups = stream::iter(pending)
            .map(|(number, status)| async move {
                let outcome = client.lookup(&number).await;
                (number, status, outcome)
            })
            .buffered(self.concurrency);
        let mut batch = Vec::new();
        loop {
            let (number, current, outcome) = match timeout_at(deadline, lookups.next()).await {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(_) => {
                    warn!("🔄️ Reconciliation cycle ran out of time after {} lookups", result.queried);
                    result.timed_out = true;
                    break;
                },
            };
            result.queried += 1;
            match outcome {
                Ok(LookupOutcome::Found(report)) => match status_update(&number, current, report) {
                    Ok(Some(update)) => {
                        debug!("🔄️ Order {number} moved from {current} to {}", update.status);
                        batch.push(update);
                    },
                    Ok(None) => trace!("🔄️ Order {number} is still {current}"),
                    Err(e) => {
                        warn!("🔄️ {e}");
                        result.failed += 1;
                    },
                },
                Ok(LookupOutcome::RateLimited { retry_after }) => {
                    let wait = retry_after.map(|d| format!(" Retry after {}s.", d.as_secs())).unwrap_or_default();
                    warn!("🔄️ The accrual service is rate limiting us. Abandoning this cycle.{wait}");
                    result.rate_limited = true;
                    break;
                },
                Ok(LookupOutcome::NotRegistered) => {
                    debug!("🔄️ Order {number} is not registered with the accrual service");
                    result.failed += 1;
                },
                Ok(outcome @ LookupOutcome::Unexpected { .. }) => {
                    warn!("🔄️ Lookup for order {number} failed: {outcome}");
                    result.failed += 1;
                },
                Err(e) => {
                    warn!("🔄️ Lookup for order {number} failed: {e}");
                    result.failed += 1;
                },
            }
        }
        drop(lookups);

        result.changed = batch.len();
        if !batch.is_empty() {
            result.written = self.db.apply_status_batch(&batch).await?;
        }
        Ok(result)
    }
}

/// Works out what, if anything, should change for an order given the accrual service's report on it.
fn status_update(
    number: &OrderNumber,
    current: OrderStatusType,
    report: AccrualReport,
) -> Result<Option<StatusUpdate>, String> {
    if &report.order != number {
        return Err(format!("Asked about order {number}, but the accrual service answered about {}", report.order));
    }
    if report.accrual.is_some_and(|accrual| accrual.value() < 0) {
        return Err(format!("The accrual service reported a negative accrual for order {number}"));
    }
    let status = report.status.to_order_status();
    if status == current {
        return Ok(None);
    }
    Ok(Some(StatusUpdate::new(number.clone(), status, report.accrual.unwrap_or_default())))
}
