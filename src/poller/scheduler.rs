use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::sleep;

/// Fixed-delay scheduler between poll cycles
#[derive(Debug, Clone, Copy)]
pub struct PollingScheduler {
    delay: Duration,
}

impl PollingScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep until the next cycle is due
    pub async fn sleep_until_next_poll(&self) {
        tracing::debug!(
            "Sleeping for {:.3} seconds until next poll",
            self.delay.as_secs_f64()
        );
        sleep(self.delay).await;
    }

    /// Wall-clock time of the next cycle if sleeping starts now
    pub fn next_poll_time(&self) -> DateTime<Utc> {
        let delay = chrono::Duration::from_std(self.delay).unwrap_or(chrono::Duration::MAX);
        Utc::now()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
