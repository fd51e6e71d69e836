//! Fixed-point monetary amounts.
//!
//! An [`Amount`] is always stored as an integer quantity of minor units
//! ("wei") together with the number of decimals of the asset. The human
//! readable value is derived on demand and never stored.

use crate::common::U256;
use crate::errors::{OnchainError, Result};
use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U512;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Decimals of every EVM native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals used to express gas prices in gwei.
pub const GWEI_DECIMALS: u8 = 9;

/// A monetary value in minor units plus its decimals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Amount {
	wei: U256,
	decimals: u8,
}

impl Amount {
	/// Creates an amount from a minor-unit integer.
	pub fn from_wei(wei: U256, decimals: u8) -> Self {
		Self { wei, decimals }
	}

	/// Creates a native-asset amount (18 decimals) from wei.
	pub fn native(wei: U256) -> Self {
		Self::from_wei(wei, NATIVE_DECIMALS)
	}

	pub fn zero(decimals: u8) -> Self {
		Self::from_wei(U256::ZERO, decimals)
	}

	/// Parses a human readable decimal string such as `"0.25"`.
	pub fn parse(value: &str, decimals: u8) -> Result<Self> {
		let value = value.trim();
		if value.starts_with('-') {
			return Err(OnchainError::Decode(format!(
				"Negative amount is not allowed: {}",
				value
			)));
		}
		let parsed = parse_units(value, decimals)
			.map_err(|e| OnchainError::Decode(format!("Invalid amount '{}': {}", value, e)))?;
		Ok(Self::from_wei(parsed.get_absolute(), decimals))
	}

	/// Converts a [`Decimal`] human value into minor units.
	pub fn from_decimal(value: Decimal, decimals: u8) -> Result<Self> {
		Self::parse(&value.normalize().to_string(), decimals)
	}

	pub fn wei(&self) -> U256 {
		self.wei
	}

	pub fn decimals(&self) -> u8 {
		self.decimals
	}

	pub fn is_zero(&self) -> bool {
		self.wei.is_zero()
	}

	/// Human scaled view. `None` when the value does not fit a `Decimal`.
	pub fn to_decimal(&self) -> Option<Decimal> {
		let formatted = format_units(self.wei, self.decimals).ok()?;
		Decimal::from_str(&formatted).ok().map(|d| d.normalize())
	}

	/// Re-expresses the amount with `decimals`. Fails instead of dropping precision.
	pub fn rescale(&self, decimals: u8) -> Result<Self> {
		if decimals == self.decimals {
			return Ok(*self);
		}
		let diff = U256::from(decimals.abs_diff(self.decimals));
		let factor = U256::from(10u64)
			.checked_pow(diff)
			.ok_or_else(|| OnchainError::Decode("decimals out of range".to_string()))?;
		let wei = if decimals > self.decimals {
			self.wei
				.checked_mul(factor)
				.ok_or_else(|| OnchainError::Decode(format!("{} overflows at {} decimals", self, decimals)))?
		} else {
			if !(self.wei % factor).is_zero() {
				return Err(OnchainError::Decode(format!(
					"{} cannot be expressed with {} decimals",
					self, decimals
				)));
			}
			self.wei / factor
		};
		Ok(Self::from_wei(wei, decimals))
	}

	/// Minor units rescaled to `decimals`, which must be >= `self.decimals`.
	fn scaled_to(&self, decimals: u8) -> Option<U512> {
		if self.wei.is_zero() {
			return Some(U512::ZERO);
		}
		let diff = u64::from(decimals - self.decimals);
		let factor = U512::from(10u64).checked_pow(U512::from(diff))?;
		U512::from_be_slice(&self.wei.to_be_bytes::<32>()).checked_mul(factor)
	}
}

impl PartialEq for Amount {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Amount {}

impl PartialOrd for Amount {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Amount {
	fn cmp(&self, other: &Self) -> Ordering {
		if self.decimals == other.decimals {
			return self.wei.cmp(&other.wei);
		}
		let decimals = self.decimals.max(other.decimals);
		// A side that overflows 512 bits after rescaling is larger than anything that fits.
		match (self.scaled_to(decimals), other.scaled_to(decimals)) {
			(Some(a), Some(b)) => a.cmp(&b),
			(None, Some(_)) => Ordering::Greater,
			(Some(_), None) => Ordering::Less,
			(None, None) => Ordering::Equal,
		}
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.to_decimal() {
			Some(value) => write!(f, "{}", value),
			None => write!(f, "{}e-{}", self.wei, self.decimals),
		}
	}
}
