//! Random sources for fee multipliers and poll pauses.

use rand::Rng;

/// Draws a value from a closed interval.
pub trait Jitter: Send + Sync {
	/// A value in `[low, high]`. Returns `low` when the interval is empty or inverted.
	fn between(&self, low: f64, high: f64) -> f64;
}

/// Uniform draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
	fn between(&self, low: f64, high: f64) -> f64 {
		if low >= high {
			return low;
		}
		rand::thread_rng().gen_range(low..=high)
	}
}

/// Always answers the same relative position inside the interval.
///
/// `FixedJitter(0.0)` yields the lower bound, `FixedJitter(1.0)` the upper one.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
	fn between(&self, low: f64, high: f64) -> f64 {
		if low >= high {
			return low;
		}
		low + (high - low) * self.0.clamp(0.0, 1.0)
	}
}
