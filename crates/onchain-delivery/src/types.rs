//! Delivery configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivery settings.
///
/// Controls receipt polling and how often transient failures are retried.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Delay between receipt polls in milliseconds.
	#[serde(default = "default_poll_interval_ms")]
	pub receipt_poll_interval_ms: u64,
	/// Maximum number of retry attempts for transient failures.
	///
	/// Only transport errors are retried. Node rejections and reverted
	/// transactions are returned immediately.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
}

fn default_poll_interval_ms() -> u64 {
	2_000
}

fn default_max_retries() -> u32 {
	3
}

impl DeliveryConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.receipt_poll_interval_ms)
	}
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			receipt_poll_interval_ms: default_poll_interval_ms(),
			max_retries: default_max_retries(),
		}
	}
}
