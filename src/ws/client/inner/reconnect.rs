use std::time::Duration;

use tokio::time::Instant;

/// Serializes recovery: at most one reconnect attempt pending at any time.
#[derive(Debug)]
pub(crate) struct ReconnectScheduler {
    delay: Duration,
    pending: Option<Instant>,
}

impl ReconnectScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Arm the timer, returns false if one is already pending
    pub fn schedule(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(Instant::now() + self.delay);
        true
    }

    /// Disarm the timer, returns true if one was pending
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Clear the pending marker when the timer fired
    pub fn fire(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Sleep until the deadline, pending forever if there is none.
pub(crate) async fn due(deadline: Option<Instant>) {
    match deadline {
        Some(tick) => tokio::time::sleep_until(tick).await,
        None => futures_util::future::pending().await,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_schedule_ignored() {
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(3));

        assert!(scheduler.schedule());
        let deadline = scheduler.deadline().unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;

        // error and close of the same failure
        assert!(!scheduler.schedule());
        assert!(!scheduler.schedule());
        assert_eq!(scheduler.deadline(), Some(deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_again_after_fire() {
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(3));

        assert!(scheduler.schedule());
        due(scheduler.deadline()).await;
        scheduler.fire();

        assert_eq!(scheduler.deadline(), None);
        assert!(scheduler.schedule());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(3));

        assert!(!scheduler.cancel());
        scheduler.schedule();
        assert!(scheduler.cancel());
        assert_eq!(scheduler.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_waits_delay() {
        let start = Instant::now();
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(3));
        scheduler.schedule();

        due(scheduler.deadline()).await;

        assert!(start.elapsed() >= scheduler.delay());
        assert!(start.elapsed() < scheduler.delay() + Duration::from_secs(1));
    }
}
