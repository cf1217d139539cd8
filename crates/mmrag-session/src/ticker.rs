use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A periodic task owned by its handle. Dropping the `Ticker` aborts the task,
/// so no tick can fire after the owner lets go of it.
///
/// Each tick runs under the `live` lock, and drop clears the flag under the
/// same lock: once drop returns, no tick is running and none will start, even
/// on a multi-threaded runtime.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    live: Arc<Mutex<bool>>,
}

impl Ticker {
    /// Call `on_tick` every `period`, first one `period` from now.
    ///
    /// Must be called inside a Tokio runtime. A zero period is clamped to 1 ms.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let first = Instant::now() + period;
        let live = Arc::new(Mutex::new(true));
        let task_live = Arc::clone(&live);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                {
                    let live = task_live.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*live {
                        break;
                    }
                    on_tick();
                }
            }
        });
        Self { handle, live }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.handle.abort();
    }
}
