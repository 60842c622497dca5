use crate::state::AppState;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info};

/// How often to look for abandoned screens, given the idle timeout.
pub fn sweep_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
}

/// Evict screens whose tab went away without a `DELETE`.
pub fn start_screen_sweeper(state: AppState, idle_timeout: Duration) -> JoinHandle<()> {
    let period = sweep_period(idle_timeout);

    tokio::spawn(async move {
        info!("Screen sweeper started (idle timeout {:?}, every {:?})", idle_timeout, period);

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = state.evict_expired_screens().await;
            if evicted > 0 {
                debug!("Evicted {} screens, {} still open", evicted, state.open_screens().await);
            }
        }
    })
}
