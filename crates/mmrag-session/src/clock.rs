//! Elapsed-time clock shown while an answer is being generated.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::ticker::Ticker;

/// `S.mmm`: whole seconds, then milliseconds zero-padded to three digits.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}.{:03}", elapsed.as_secs(), elapsed.subsec_millis())
}

/// Publishes the time since the last [`restart`](Self::restart).
///
/// The published value never decreases between restarts. After
/// [`stop`](Self::stop) it stays frozen at the final reading.
#[derive(Debug)]
pub struct ElapsedClock {
    period: Duration,
    elapsed: Arc<watch::Sender<Duration>>,
    started_at: Option<Instant>,
    ticker: Option<Ticker>,
}

impl ElapsedClock {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let (elapsed, _) = watch::channel(Duration::ZERO);
        Self {
            period,
            elapsed: Arc::new(elapsed),
            started_at: None,
            ticker: None,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.elapsed.subscribe()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.borrow()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Reset to zero and start counting from now.
    pub fn restart(&mut self) {
        self.ticker = None;
        let started_at = Instant::now();
        self.started_at = Some(started_at);
        self.elapsed.send_replace(Duration::ZERO);

        let elapsed = Arc::clone(&self.elapsed);
        self.ticker = Some(Ticker::spawn(self.period, move || {
            publish(&elapsed, started_at.elapsed());
        }));
    }

    /// Stop counting; the last reading stays published.
    pub fn stop(&mut self) {
        self.ticker = None;
        if let Some(started_at) = self.started_at.take() {
            publish(&self.elapsed, started_at.elapsed());
        }
    }
}

fn publish(elapsed: &watch::Sender<Duration>, reading: Duration) {
    elapsed.send_if_modified(|current| {
        if reading > *current {
            *current = reading;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::ZERO, "0.000")]
    #[case(Duration::from_millis(7), "0.007")]
    #[case(Duration::from_millis(1_050), "1.050")]
    #[case(Duration::from_micros(12_345_999), "12.345")]
    #[case(Duration::from_secs(125), "125.000")]
    fn formats_seconds_and_padded_millis(#[case] elapsed: Duration, #[case] expected: &str) {
        assert_eq!(format_elapsed(elapsed), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_while_running() {
        let mut clock = ElapsedClock::new(Duration::from_millis(10));
        clock.restart();

        let mut last = clock.elapsed();
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(35)).await;
            let now = clock.elapsed();
            assert!(now >= last, "clock went backwards: {last:?} -> {now:?}");
            last = now;
        }
        assert!(last >= Duration::from_millis(690));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_final_value() {
        let mut clock = ElapsedClock::new(Duration::from_millis(10));
        clock.restart();
        tokio::time::sleep(Duration::from_millis(1_234)).await;
        clock.stop();

        let frozen = clock.elapsed();
        assert!(frozen >= Duration::from_millis(1_234));
        assert!(frozen < Duration::from_millis(1_240));
        assert!(!clock.is_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(clock.elapsed(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_to_zero() {
        let mut clock = ElapsedClock::new(Duration::from_millis(10));
        clock.restart();
        tokio::time::sleep(Duration::from_millis(500)).await;
        clock.stop();

        clock.restart();
        assert_eq!(clock.elapsed(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(105)).await;
        assert!(clock.elapsed() >= Duration::from_millis(100));
        assert!(clock.elapsed() < Duration::from_millis(500));
    }
}
