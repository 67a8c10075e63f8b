use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Ticker of the liveness probe, one per connected period.
#[derive(Debug)]
pub(crate) struct Heartbeat {
    ticker: Interval,
}

impl Heartbeat {
    /// first probe is sent one full interval after start
    pub fn start(period: Duration) -> Self {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ticker }
    }

    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}

/// Wait next tick of an optional heartbeat, pending forever when stopped.
pub(crate) async fn tick(heartbeat: &mut Option<Heartbeat>) {
    match heartbeat {
        Some(h) => h.tick().await,
        None => futures_util::future::pending().await,
    }
}
