//! Reconnect backoff schedule.

use std::time::Duration;

use visadesk_core::config::RealtimeConfig;

/// Exponential backoff with a ceiling and a bounded number of attempts.
///
/// The delay before the next attempt after `k` consecutive failures is
/// `min(initial * 2^k, max)`. A drop of an established connection counts as
/// zero failures, so the first retry waits `initial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Base delay.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Consecutive failures after which reconnection stops.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Build the policy from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            max_delay: config.max_delay(),
            max_attempts: config.max_reconnect_attempts,
        }
    }

    /// Delay for the given number of consecutive failures, ignoring the cap
    /// on attempts.
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay before the next attempt, or `None` once `failures` reached the
    /// attempt cap.
    pub fn next_delay(&self, failures: u32) -> Option<Duration> {
        (failures < self.max_attempts).then(|| self.backoff(failures))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}
