use crate::machine_logic::state::FeederState;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;

/// Logs the axis-sample insert rate once per second. The counter is fed
/// by the axis writer loop; a zero round with provisioned axes usually
/// means the store is refusing writes.
pub async fn run(state: FeederState, mut shutdown: broadcast::Receiver<()>) {
    let mut check_interval = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("insert-rate monitor received shutdown signal");
                break;
            }
            _ = check_interval.tick() => {
                let inserted = state.axis_inserts.swap(0, Ordering::Relaxed);
                if inserted > 0 {
                    tracing::info!("axis samples inserted in the last second: {}", inserted);
                }
            }
        }
    }
}
