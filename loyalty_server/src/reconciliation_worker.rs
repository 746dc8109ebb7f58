use actix_web::rt;
use log::*;
use loyalty_engine::{AccrualLookup, LoyaltyGatewayDatabase, ReconciliationApi};
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Starts the order status reconciliation worker.
///
/// The first cycle runs immediately, and then every `reconcile_interval`. A cycle that overruns the interval delays the
/// next tick rather than triggering a burst of catch-up cycles. The worker exits when `shutdown` is cancelled, abandoning
/// any cycle in flight. Changes from an abandoned cycle are not written, and will be picked up again next time.
///
/// The worker is spawned on the current actix runtime's local task set, so it must be called from within one.
pub fn start_reconciliation_worker<B, C>(
    db: B,
    client: C,
    config: WorkerConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    B: LoyaltyGatewayDatabase + 'static,
    C: AccrualLookup + 'static,
{
    rt::spawn(async move {
        let api = ReconciliationApi::new(db, client)
            .with_cycle_timeout(config.reconcile_timeout)
            .with_concurrency(config.reconcile_concurrency);
        let mut timer = interval(config.reconcile_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "🔄️ Order status reconciliation worker started. Interval: {}s, cycle timeout: {}s",
            config.reconcile_interval.as_secs(),
            config.reconcile_timeout.as_secs()
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {},
            }
            debug!("🔄️ Running order status reconciliation cycle");
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("🔄️ Shutdown requested during a reconciliation cycle. Abandoning it.");
                    break;
                },
                result = api.run_cycle() => match result {
                    Ok(result) => info!("🔄️ Reconciliation cycle complete. {result}"),
                    Err(e) => error!("🔄️ Reconciliation cycle failed. The pending orders will be retried. {e}"),
                },
            }
        }
        info!("🔄️ Order status reconciliation worker stopped");
    })
}
