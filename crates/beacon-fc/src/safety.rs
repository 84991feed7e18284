use std::time::{Duration, Instant};
use tracing::warn;

/// Keeps a fast loop from flooding the log with the same actuation failure:
/// the first failure is logged, then at most one line per `min_interval`
/// carrying the count of suppressed repeats.
#[derive(Debug)]
pub struct ErrorThrottle {
    last: Option<Instant>,
    suppressed: u64,
    min_interval: Duration,
}

impl ErrorThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self { last: None, suppressed: 0, min_interval }
    }

    /// Returns true when the failure was actually logged.
    pub fn report(&mut self, what: &str, err: &dyn std::fmt::Display) -> bool {
        let now = Instant::now();
        if let Some(t) = self.last {
            if now.duration_since(t) < self.min_interval {
                self.suppressed += 1;
                return false;
            }
        }
        if self.suppressed > 0 {
            warn!("fc: {} failed: {} ({} more since last report)", what, err, self.suppressed);
        } else {
            warn!("fc: {} failed: {}", what, err);
        }
        self.last = Some(now);
        self.suppressed = 0;
        true
    }

    pub fn suppressed(&self) -> u64 { self.suppressed }
}
