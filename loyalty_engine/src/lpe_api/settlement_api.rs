use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    lpe_api::errors::SettlementError,
    traits::{LoyaltyGatewayDatabase, SettlementResult},
};

pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(300);

/// `SettlementApi` brings every user's balance snapshot up to date with their orders and withdrawals.
///
/// Balances are always readable live without settling first. Settling only keeps those live reads cheap.
pub struct SettlementApi<B> {
    db: B,
    timeout: Duration,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi (timeout: {:?})", self.timeout)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, timeout: DEFAULT_SETTLEMENT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<B> SettlementApi<B>
where B: LoyaltyGatewayDatabase
{
    /// Folds all unsettled activity into the balance snapshots. Running it again straight away changes nothing.
    pub async fn settle(&self) -> Result<SettlementResult, SettlementError> {
        let snapshots_updated = tokio::time::timeout(self.timeout, self.db.fold_balances())
            .await
            .map_err(|_| SettlementError::TimedOut(self.timeout))??;
        trace!("⚖️ Fold moved {snapshots_updated} balance snapshots");
        Ok(SettlementResult { snapshots_updated })
    }
}
