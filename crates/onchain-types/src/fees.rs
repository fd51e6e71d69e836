//! Fee multiplier configuration.
//!
//! Every fee and gas figure sent on chain is inflated by a factor drawn
//! uniformly from a [`MultiplierRange`]. Two ranges exist: `fee_range` for
//! gas prices and `safety_range` for gas limits and balance checks.

use crate::errors::{OnchainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed interval `[min, max]` of positive multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct MultiplierRange {
	min: f64,
	max: f64,
}

impl MultiplierRange {
	pub fn new(min: f64, max: f64) -> Result<Self> {
		if !min.is_finite() || !max.is_finite() || min <= 0.0 {
			return Err(OnchainError::Config(format!(
				"multiplier range [{}, {}] must be positive",
				min, max
			)));
		}
		if min > max {
			return Err(OnchainError::Config(format!(
				"multiplier range [{}, {}] is not ordered",
				min, max
			)));
		}
		Ok(Self { min, max })
	}

	pub fn min(&self) -> f64 {
		self.min
	}

	pub fn max(&self) -> f64 {
		self.max
	}

	/// Default range applied to gas prices.
	pub fn fee_default() -> Self {
		Self { min: 1.03, max: 1.10 }
	}

	/// Default range applied to gas limits and fee reserves.
	pub fn safety_default() -> Self {
		Self { min: 1.1, max: 1.2 }
	}
}

impl TryFrom<[f64; 2]> for MultiplierRange {
	type Error = OnchainError;

	fn try_from(value: [f64; 2]) -> Result<Self> {
		Self::new(value[0], value[1])
	}
}

impl From<MultiplierRange> for [f64; 2] {
	fn from(range: MultiplierRange) -> Self {
		[range.min, range.max]
	}
}

impl fmt::Display for MultiplierRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.min, self.max)
	}
}

fn default_fee_range() -> MultiplierRange {
	MultiplierRange::fee_default()
}

fn default_safety_range() -> MultiplierRange {
	MultiplierRange::safety_default()
}

fn default_gas_wait_interval() -> [f64; 2] {
	[5.0, 10.0]
}

/// `[fees]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
	#[serde(default = "default_fee_range")]
	pub fee_range: MultiplierRange,
	#[serde(default = "default_safety_range")]
	pub safety_range: MultiplierRange,
	/// Bounds in seconds of the random pause between gas price polls.
	#[serde(default = "default_gas_wait_interval")]
	pub gas_wait_interval_secs: [f64; 2],
}

impl Default for FeeConfig {
	fn default() -> Self {
		Self {
			fee_range: default_fee_range(),
			safety_range: default_safety_range(),
			gas_wait_interval_secs: default_gas_wait_interval(),
		}
	}
}
