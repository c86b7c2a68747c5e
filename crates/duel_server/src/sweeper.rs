//! Periodic background cleanup.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

/// Call `sweep` with the current time every `every` until the task is aborted.
///
/// The first sweep happens immediately.
pub fn spawn_sweeper(
    every: Duration,
    mut sweep: impl FnMut(DateTime<Utc>) + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            sweep(Utc::now());
        }
    })
}
