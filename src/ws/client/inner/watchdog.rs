use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Inactivity watchdog, detects half-open connection by polling last activity.
#[derive(Debug)]
pub(crate) struct Watchdog {
    ticker: Interval,
    silence: Duration,
    last_activity: Instant,
}

impl Watchdog {
    /// Each connection starts with a full silence window
    pub fn start(poll: Duration, silence: Duration) -> Self {
        let now = Instant::now();
        let mut ticker = tokio::time::interval_at(now + poll, poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker,
            silence,
            last_activity: now,
        }
    }

    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }

    /// record activity observed now
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn silence(&self) -> Duration {
        self.silence
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_activity) > self.silence
    }
}

/// Wait next tick of an optional watchdog, pending forever when stopped.
pub(crate) async fn tick(watchdog: &mut Option<Watchdog>) {
    match watchdog {
        Some(w) => w.tick().await,
        None => futures_util::future::pending().await,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expire_only_after_silence_window() {
        let watchdog = Watchdog::start(Duration::from_secs(60), Duration::from_secs(600));
        let start = watchdog.last_activity();

        assert!(!watchdog.is_expired(start + Duration::from_secs(600)));
        assert!(watchdog.is_expired(start + Duration::from_secs(601)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_moves_deadline() {
        let mut watchdog = Watchdog::start(Duration::from_secs(60), Duration::from_secs(600));

        tokio::time::sleep(Duration::from_secs(500)).await;
        watchdog.touch();

        assert!(!watchdog.is_expired(Instant::now() + Duration::from_secs(599)));
        assert!(watchdog.is_expired(Instant::now() + Duration::from_secs(601)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_opens_fresh_window() {
        let first = Watchdog::start(Duration::from_secs(60), Duration::from_secs(600));

        tokio::time::sleep(Duration::from_secs(700)).await;
        assert!(first.is_expired(Instant::now()));

        let second = Watchdog::start(Duration::from_secs(60), Duration::from_secs(600));
        assert_eq!(second.last_activity(), Instant::now());
        assert!(!second.is_expired(Instant::now() + Duration::from_secs(600)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_interval() {
        let start = Instant::now();
        let mut watchdog = Watchdog::start(Duration::from_secs(60), Duration::from_secs(600));

        watchdog.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(start.elapsed() < Duration::from_secs(61));
    }
}
