//! "Generating response..." suffix animation.
//!
//! Frames cycle `""`, `"."`, `".."`, `"..."`, then back to `""`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::ticker::Ticker;

/// Longest frame.
pub const MAX_DOTS: usize = 3;

/// The frame after `frame`.
#[must_use]
pub fn next_frame(frame: &str) -> String {
    if frame.len() < MAX_DOTS {
        format!("{frame}.")
    } else {
        String::new()
    }
}

/// Publishes the current frame while started; holds `""` while stopped.
#[derive(Debug)]
pub struct DotsAnimator {
    period: Duration,
    frame: Arc<watch::Sender<String>>,
    ticker: Option<Ticker>,
}

impl DotsAnimator {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let (frame, _) = watch::channel(String::new());
        Self {
            period,
            frame: Arc::new(frame),
            ticker: None,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.frame.subscribe()
    }

    #[must_use]
    pub fn frame(&self) -> String {
        self.frame.borrow().clone()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start cycling from `""`. No-op while already running.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        self.frame.send_replace(String::new());
        let frame = Arc::clone(&self.frame);
        self.ticker = Some(Ticker::spawn(self.period, move || {
            frame.send_modify(|current| *current = next_frame(current));
        }));
    }

    /// Tear down the ticker and reset to `""`.
    pub fn stop(&mut self) {
        self.ticker = None;
        self.frame.send_if_modified(|current| {
            if current.is_empty() {
                false
            } else {
                current.clear();
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cycle_has_period_four() {
        let mut frame = String::new();
        let mut seen = Vec::new();
        for _ in 0..8 {
            frame = next_frame(&frame);
            assert!(frame.len() <= MAX_DOTS);
            seen.push(frame.clone());
        }
        assert_eq!(seen, [".", "..", "...", "", ".", "..", "...", ""]);
    }

    #[test]
    fn oversized_frame_resets() {
        assert_eq!(next_frame("....."), "");
    }

    #[tokio::test(start_paused = true)]
    async fn animates_while_started() {
        let mut dots = DotsAnimator::new(Duration::from_millis(500));
        assert_eq!(dots.frame(), "");

        dots.start();
        tokio::time::sleep(Duration::from_millis(1250)).await;
        assert_eq!(dots.frame(), "..");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(dots.frame(), "");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(dots.frame(), ".");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_holds_empty_frame() {
        let mut dots = DotsAnimator::new(Duration::from_millis(500));
        dots.start();
        tokio::time::sleep(Duration::from_millis(750)).await;
        assert_eq!(dots.frame(), ".");

        dots.stop();
        assert!(!dots.is_running());
        assert_eq!(dots.frame(), "");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(dots.frame(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let mut dots = DotsAnimator::new(Duration::from_millis(500));
        dots.start();
        tokio::time::sleep(Duration::from_millis(1250)).await;
        dots.start();
        assert_eq!(dots.frame(), "..");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_holds_empty_frame_on_worker_threads() {
        let mut dots = DotsAnimator::new(Duration::from_millis(1));
        for _ in 0..20 {
            dots.start();
            tokio::time::sleep(Duration::from_millis(3)).await;
            dots.stop();
            assert_eq!(dots.frame(), "");

            tokio::time::sleep(Duration::from_millis(3)).await;
            assert_eq!(dots.frame(), "");
        }
    }
}
