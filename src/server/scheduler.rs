use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::polling::{PollingContext, Trigger, run_ping_check, run_traffic_sync};

/// Starts both periodic jobs. Each runs once immediately and then on its own interval; a run
/// that overruns its interval delays the next one instead of causing a burst.
pub fn spawn_periodic_jobs(
    ctx: Arc<PollingContext>,
    traffic_sync_every: Duration,
    ping_check_every: Duration,
) -> Vec<JoinHandle<()>> {
    let traffic_ctx = ctx.clone();
    let traffic = spawn_job("traffic_sync", traffic_sync_every, move || {
        let ctx = traffic_ctx.clone();
        async move {
            if let Err(e) = run_traffic_sync(&ctx, Trigger::Scheduled).await {
                error!(error = %e, "Traffic sync run failed.");
            }
        }
    });

    let ping = spawn_job("ping_check", ping_check_every, move || {
        let ctx = ctx.clone();
        async move {
            if let Err(e) = run_ping_check(&ctx, Trigger::Scheduled).await {
                error!(error = %e, "Ping check run failed.");
            }
        }
    });

    vec![traffic, ping]
}

fn spawn_job<F, Fut>(name: &'static str, period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(job = name, interval_secs = period.as_secs(), "Periodic job started.");
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}
