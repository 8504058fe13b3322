//! Delay schedules for job-completion loops.
//!
//! Two strategies share this module:
//!
//! * [`StatusCheckConfig`] drives the webhook status-check loop. Delays
//!   grow geometrically with a random jitter and are clamped into
//!   `[min_interval, max_interval]`.
//! * [`PollConfig`] drives active polling of a fetch endpoint on a fixed
//!   interval.
//!
//! Jitter is injected through the [`Jitter`] trait so that tests can run
//! the schedule deterministically.

use std::time::Duration;

use rand::Rng;

/// Source of the random component added to each status-check delay.
pub trait Jitter: Send + Sync {
    /// Return a duration in `[0, max]`.
    fn sample(&self, max: Duration) -> Duration;
}

/// Uniform jitter from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self, max: Duration) -> Duration {
        let max_ms = max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

/// Always zero. Makes the schedule a pure function of its config.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Tunables for the status-check loop with webhook fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCheckConfig {
    /// Maximum number of status requests.
    pub max_attempts: u32,
    /// Wall-clock ceiling measured from the start of the loop.
    pub max_elapsed: Duration,
    /// First delay, and the lower bound of every delay.
    pub min_interval: Duration,
    /// Upper bound of every delay.
    pub max_interval: Duration,
    /// Growth factor applied to the previous delay.
    pub multiplier: f64,
    /// Upper bound of the random component added on each step.
    pub max_jitter: Duration,
    /// Elapsed time after which a missing webhook triggers the switch to
    /// active polling, when the status payload offers a fetch URL.
    pub webhook_fallback_after: Duration,
}

impl Default for StatusCheckConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            max_elapsed: Duration::from_secs(600),
            min_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(15),
            multiplier: 1.5,
            max_jitter: Duration::from_secs(1),
            webhook_fallback_after: Duration::from_secs(30),
        }
    }
}

impl StatusCheckConfig {
    /// Calculate the next delay from the current one.
    ///
    /// `min(prev * multiplier + jitter, max_interval)`, never below
    /// `min_interval`.
    pub fn next_delay(&self, current: Duration, jitter: &dyn Jitter) -> Duration {
        let grown_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        let next = Duration::from_millis(grown_ms) + jitter.sample(self.max_jitter);
        next.clamp(self.min_interval, self.max_interval.max(self.min_interval))
    }
}

/// Tunables for active polling of a fetch endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay before each fetch attempt.
    pub interval: Duration,
    /// Maximum number of fetch attempts.
    pub max_attempts: u32,
}

impl PollConfig {
    /// Short-lived jobs (deepfake, image): 2 s × 60 attempts.
    pub fn short() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }

    /// Heavier video jobs: 10 s × 30 attempts.
    pub fn video() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }

    /// Total time the loop may spend waiting before it gives up.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Jitter that always returns its maximum.
    struct MaxJitter;

    impl Jitter for MaxJitter {
        fn sample(&self, max: Duration) -> Duration {
            max
        }
    }

    #[test]
    fn next_delay_grows_by_multiplier() {
        let config = StatusCheckConfig::default();
        let d = config.next_delay(Duration::from_secs(2), &NoJitter);
        assert_eq!(d, Duration::from_secs(3));
    }

    #[test]
    fn next_delay_adds_jitter() {
        let config = StatusCheckConfig::default();
        let d = config.next_delay(Duration::from_secs(2), &MaxJitter);
        assert_eq!(d, Duration::from_secs(4));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = StatusCheckConfig::default();
        let d = config.next_delay(Duration::from_secs(14), &MaxJitter);
        assert_eq!(d, Duration::from_secs(15));
    }

    #[test]
    fn next_delay_never_below_min() {
        let config = StatusCheckConfig::default();
        let d = config.next_delay(Duration::from_millis(100), &NoJitter);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn full_backoff_sequence_without_jitter() {
        let config = StatusCheckConfig::default();
        let mut delay = config.min_interval;
        let expected_ms = [2000, 3000, 4500, 6750, 10125, 15000, 15000];

        for &ms in &expected_ms {
            assert_eq!(delay, Duration::from_millis(ms));
            delay = config.next_delay(delay, &NoJitter);
        }
    }

    #[test]
    fn random_jitter_stays_within_bounds() {
        let config = StatusCheckConfig::default();
        let mut delay = config.min_interval;
        for _ in 0..200 {
            delay = config.next_delay(delay, &RandomJitter);
            assert!(delay >= config.min_interval);
            assert!(delay <= config.max_interval);
        }
    }

    #[test]
    fn random_jitter_zero_max_is_zero() {
        assert_eq!(RandomJitter.sample(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn poll_presets() {
        assert_eq!(PollConfig::short().ceiling(), Duration::from_secs(120));
        assert_eq!(PollConfig::video().ceiling(), Duration::from_secs(300));
    }
}
