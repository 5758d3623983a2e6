//! Exponential reconnect delay with optional jitter.

use std::time::Duration;

use canstream_config::schema::ReconnectConfig;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    jitter: f64,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            multiplier: multiplier.max(1.0),
            jitter: jitter.clamp(0.0, 1.0),
            current: initial,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            config.initial_delay(),
            config.max_delay(),
            config.multiplier,
            config.jitter,
        )
    }

    /// Delay to wait before the next attempt. Grows the base for the one after.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = scale(base, self.multiplier).min(self.max);
        self.apply_jitter(base)
    }

    /// Back to the initial delay, after a connection succeeded.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    /// Adopt a server-sent `retry:` value as the new initial delay.
    pub fn set_initial(&mut self, delay: Duration) {
        self.initial = delay;
        self.max = self.max.max(delay);
        self.current = delay;
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    fn apply_jitter(&self, base: Duration) -> Duration {
        if self.jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        scale(base, factor)
    }
}

/// `duration * factor`, rounded to the nanosecond and saturating.
fn scale(duration: Duration, factor: f64) -> Duration {
    let nanos = (duration.as_nanos() as f64 * factor).round();
    Duration::from_nanos(nanos.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn doubles_until_capped() {
        let mut backoff = Backoff::new(ms(100), ms(500), 2.0, 0.0);
        let delays: Vec<_> = (0..5).map(|_| backoff.next_delay()).collect();
        assert_eq!(delays, [ms(100), ms(200), ms(400), ms(500), ms(500)]);
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut backoff = Backoff::new(ms(100), ms(1_000), 2.0, 0.0);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), ms(100));
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let mut backoff = Backoff::new(ms(250), ms(1_000), 1.0, 0.0);
        assert_eq!(backoff.next_delay(), ms(250));
        assert_eq!(backoff.next_delay(), ms(250));
    }

    #[test]
    fn server_retry_replaces_initial() {
        let mut backoff = Backoff::new(ms(1_000), ms(30_000), 2.0, 0.0);
        backoff.next_delay();
        backoff.set_initial(ms(50));
        assert_eq!(backoff.next_delay(), ms(50));
        backoff.reset();
        assert_eq!(backoff.initial(), ms(50));
        assert_eq!(backoff.next_delay(), ms(50));
    }

    #[test]
    fn server_retry_above_max_raises_max() {
        let mut backoff = Backoff::new(ms(100), ms(200), 2.0, 0.0);
        backoff.set_initial(ms(5_000));
        assert_eq!(backoff.next_delay(), ms(5_000));
        assert_eq!(backoff.next_delay(), ms(5_000));
    }

    #[test]
    fn jitter_stays_within_spread() {
        let mut backoff = Backoff::new(ms(1_000), ms(1_000), 1.0, 0.2);
        for _ in 0..100 {
            let delay = backoff.next_delay();
            assert!(delay >= ms(800) && delay <= ms(1_200), "{delay:?}");
        }
    }

    #[test]
    fn from_config_uses_defaults() {
        let mut backoff = Backoff::from_config(&ReconnectConfig::default());
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }
}
