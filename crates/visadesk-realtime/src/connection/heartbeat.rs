//! Server-activity tracking and keepalive pacing for the push connection.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use visadesk_core::config::RealtimeConfig;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Interval between client keepalive pings. Zero disables pings.
    pub keepalive_interval: Duration,
    /// Silence after which the connection is considered stale. Zero disables
    /// the check.
    pub timeout: Duration,
}

impl HeartbeatConfig {
    /// Build from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            keepalive_interval: config.keepalive_interval(),
            timeout: config.heartbeat_timeout(),
        }
    }

    /// Keepalive ticker, first tick one interval from now.
    pub fn keepalive(&self) -> Option<Interval> {
        if self.keepalive_interval.is_zero() {
            return None;
        }
        let mut interval = time::interval_at(
            Instant::now() + self.keepalive_interval,
            self.keepalive_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Some(interval)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

/// Tracks the last time the server showed any sign of life.
#[derive(Debug)]
pub struct ActivityTracker {
    timeout: Duration,
    last_seen: Instant,
}

impl ActivityTracker {
    /// Start tracking from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: Instant::now(),
        }
    }

    /// Record server activity.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Instant at which the connection becomes stale, if the check is enabled.
    pub fn deadline(&self) -> Option<Instant> {
        (!self.timeout.is_zero()).then(|| self.last_seen + self.timeout)
    }

    /// Time since the last activity.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

/// Wait for the next keepalive tick, or forever when pings are disabled.
pub async fn next_keepalive(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Wait until the tracker's deadline, or forever when the check is disabled.
pub async fn stale(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_touch_moves_deadline() {
        let mut tracker = ActivityTracker::new(Duration::from_secs(5));
        let first = tracker.deadline().expect("enabled");
        time::advance(Duration::from_secs(3)).await;
        tracker.touch();
        let second = tracker.deadline().expect("enabled");
        assert_eq!(second - first, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_disables_check() {
        let tracker = ActivityTracker::new(Duration::ZERO);
        assert!(tracker.deadline().is_none());
        let cfg = HeartbeatConfig {
            keepalive_interval: Duration::ZERO,
            timeout: Duration::ZERO,
        };
        assert!(cfg.keepalive().is_none());
    }
}
