use std::time::Duration;

use rand::Rng;

pub const BACKOFF_INITIAL_MS: u64 = 200;
pub const BACKOFF_MAX_MS: u64 = 30_000;

/// Jittered exponential delay for the mirror's reconnect path.
///
/// The nominal delay doubles on every call up to `max`; the returned delay
/// is drawn uniformly from `[nominal / 2, nominal]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let nominal = self.current;
        let next = nominal.saturating_mul(2);
        self.current = if next > self.max { self.max } else { next };
        jitter(nominal)
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(BACKOFF_INITIAL_MS),
            Duration::from_millis(BACKOFF_MAX_MS),
        )
    }
}

fn jitter(nominal: Duration) -> Duration {
    let upper = nominal.as_millis().min(u128::from(u64::MAX)) as u64;
    let lower = upper / 2;
    Duration::from_millis(rand::thread_rng().gen_range(lower..=upper))
}
