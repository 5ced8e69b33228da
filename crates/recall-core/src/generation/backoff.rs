//! Exponential backoff for generation retries

use std::time::Duration;

/// Configuration for backoff behavior
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Add random jitter so concurrent retries spread out
    pub jitter: bool,
    /// Maximum jitter ratio (0.0 - 1.0)
    pub jitter_ratio: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
            jitter_ratio: 0.2,
        }
    }
}

/// Exponential backoff: `initial_delay * multiplier^attempt`, capped
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay.as_secs_f64()
            * self.config.multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let capped = base.min(self.config.max_delay.as_secs_f64());
        self.add_jitter(Duration::from_secs_f64(capped.max(0.0)))
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        if !self.config.jitter {
            return delay;
        }
        let range = delay.as_secs_f64() * self.config.jitter_ratio;
        Duration::from_secs_f64((delay.as_secs_f64() + rand_jitter(range)).max(0.0))
    }
}

/// Pseudo-random value in `[0, range)` derived from the clock
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let hash = nanos.wrapping_mul(2654435761);
    (hash as f64) / (u32::MAX as f64) * range
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(initial: Duration, max: Duration) -> ExponentialBackoff {
        ExponentialBackoff::new(BackoffConfig {
            initial_delay: initial,
            max_delay: max,
            multiplier: 2.0,
            jitter: false,
            jitter_ratio: 0.0,
        })
    }

    #[test]
    fn test_delays_double() {
        let backoff = no_jitter(Duration::from_millis(100), Duration::from_secs(10));
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = no_jitter(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let backoff = ExponentialBackoff::new(BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: true,
            jitter_ratio: 0.5,
        });
        let delay = backoff.delay_for_attempt(0);
        assert!(delay >= Duration::from_millis(100));
        assert!(delay <= Duration::from_millis(150));
    }
}
