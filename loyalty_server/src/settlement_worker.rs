use std::time::Duration;

use actix_web::rt;
use chrono::{DateTime, Utc};
use log::*;
use loyalty_engine::{LoyaltyGatewayDatabase, SettlementApi};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Starts the balance settlement worker.
///
/// Settlement runs on interval boundaries counted from the Unix epoch, so with the default daily interval it runs at
/// midnight UTC. It never runs on startup: balance reads are correct without it.
///
/// Like the reconciliation worker, it is spawned on the current actix runtime's local task set.
pub fn start_settlement_worker<B>(db: B, config: WorkerConfig, shutdown: CancellationToken) -> JoinHandle<()>
where B: LoyaltyGatewayDatabase + 'static {
    rt::spawn(async move {
        let api = SettlementApi::new(db).with_timeout(config.settlement_timeout);
        info!("⚖️ Balance settlement worker started. Interval: {}s", config.settlement_interval.as_secs());
        loop {
            let delay = next_aligned_delay(Utc::now(), config.settlement_interval);
            debug!("⚖️ Next balance settlement in {}s", delay.as_secs());
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {},
            }
            info!("⚖️ Running balance settlement");
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("⚖️ Shutdown requested during settlement. Abandoning it.");
                    break;
                },
                result = api.settle() => match result {
                    Ok(result) => info!("⚖️ Balance settlement complete. {} snapshots updated", result.snapshots_updated),
                    Err(e) => error!("⚖️ Balance settlement failed. It will be retried at the next interval. {e}"),
                },
            }
        }
        info!("⚖️ Balance settlement worker stopped");
    })
}

/// Time from `now` until the next multiple of `interval` since the Unix epoch. On an exact boundary, this is a full
/// interval.
pub fn next_aligned_delay(now: DateTime<Utc>, interval: Duration) -> Duration {
    let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
    let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    Duration::from_millis(interval_ms - now_ms % interval_ms)
}
