use crate::config::{Bounds, Config};
use rand::Rng;
use std::time::Duration;

/// Decimal places used when drawing transfer amounts.
pub const AMOUNT_PRECISION: u32 = 10;

/// Draw a uniform random decimal in `[min, max]` with the given precision.
///
/// The bounds are scaled to integers (ceil for min, floor for max, so the
/// result can never escape the closed range), drawn inclusively, and scaled
/// back.
pub fn next_amount<R: Rng>(rng: &mut R, min: f64, max: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let min_scaled = (min * scale).ceil() as i64;
    let max_scaled = (max * scale).floor() as i64;
    if min_scaled >= max_scaled {
        // Range narrower than the precision grid; min is always in bounds.
        return min;
    }
    rng.gen_range(min_scaled..=max_scaled) as f64 / scale
}

/// Draw a uniform random delay in `[min, max]` milliseconds, inclusive.
pub fn next_delay<R: Rng>(rng: &mut R, min: u64, max: u64) -> u64 {
    rng.gen_range(min..=max)
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// The configured randomized-draw bounds for one worker: transfer amount,
/// inter-attempt interval, and transient-failure backoff.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    amount: Bounds<f64>,
    interval: Bounds<u64>,
    backoff: Bounds<u64>,
}

impl Pacing {
    pub fn from_config(config: &Config) -> Self {
        Self {
            amount: Bounds {
                min: config.min_amount,
                max: config.max_amount,
            },
            interval: config.interval,
            backoff: config.delay,
        }
    }

    pub fn amount<R: Rng>(&self, rng: &mut R) -> f64 {
        next_amount(rng, self.amount.min, self.amount.max, AMOUNT_PRECISION)
    }

    /// Pacing delay between scheduled attempts.
    pub fn interval<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(next_delay(rng, self.interval.min, self.interval.max))
    }

    /// Backoff before retrying a transient failure.
    pub fn backoff<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(next_delay(rng, self.backoff.min, self.backoff.max))
    }

    /// Upper pacing bound; fixed-count workers stagger their start within it.
    pub fn max_interval(&self) -> u64 {
        self.interval.max
    }
}
