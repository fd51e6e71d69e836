//! Utility types for chain clients.
//!
//! This module provides retry logic shared by the RPC client and the delivery
//! pipeline. Only errors classified as transient are retried.

use backoff::{backoff::Backoff, ExponentialBackoff};
use onchain_types::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy for automatic retries.
///
/// Wraps exponential backoff with an attempt cap. The maximum retry duration
/// is 30 seconds by default; after that the last error is returned.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
	backoff: ExponentialBackoff,
	max_retries: u32,
}

impl RetryPolicy {
	/// Creates a policy with the default backoff and 3 retries.
	pub fn new() -> Self {
		let backoff = ExponentialBackoff {
			max_elapsed_time: Some(Duration::from_secs(30)),
			..Default::default()
		};

		Self {
			backoff,
			max_retries: 3,
		}
	}

	/// Sets the maximum number of retry attempts.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	/// Sets the first delay between attempts.
	pub fn with_initial_interval(mut self, interval: Duration) -> Self {
		self.backoff.initial_interval = interval;
		self.backoff.current_interval = interval;
		self
	}

	pub fn max_retries(&self) -> u32 {
		self.max_retries
	}

	/// Runs `op` until it succeeds, fails permanently, or retries run out.
	pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut backoff = self.backoff.clone();
		backoff.reset();
		let mut attempts = 0;

		loop {
			match op().await {
				Ok(result) => return Ok(result),
				Err(e) if !e.is_transient() => return Err(e),
				Err(e) => {
					attempts += 1;

					if attempts > self.max_retries {
						warn!(
							"{} failed after {} attempts, giving up: {}",
							operation, attempts, e
						);
						return Err(e);
					}

					if let Some(delay) = backoff.next_backoff() {
						warn!(
							"{} failed, attempt {}/{}, retrying in {:?}: {}",
							operation, attempts, self.max_retries, delay, e
						);
						tokio::time::sleep(delay).await;
					} else {
						warn!(
							"{} failed, backoff exhausted after {} attempts: {}",
							operation, attempts, e
						);
						return Err(e);
					}
				}
			}
		}
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use onchain_types::OnchainError;
	use std::sync::atomic::{AtomicU32, Ordering};

	fn fast_policy(max_retries: u32) -> RetryPolicy {
		RetryPolicy::new()
			.with_max_retries(max_retries)
			.with_initial_interval(Duration::from_millis(1))
	}

	#[test]
	fn test_retry_policy_defaults() {
		let policy = RetryPolicy::new();
		assert_eq!(
			policy.backoff.max_elapsed_time,
			Some(Duration::from_secs(30))
		);
		assert_eq!(policy.max_retries(), 3);
	}

	#[tokio::test]
	async fn test_transient_errors_are_retried() {
		let counter = AtomicU32::new(0);
		let calls = &counter;
		let result = fast_policy(3)
			.run("eth_gasPrice", move || async move {
				if calls.fetch_add(1, Ordering::SeqCst) < 2 {
					Err(OnchainError::Network("connection reset".into()))
				} else {
					Ok(7u64)
				}
			})
			.await;

		assert_eq!(result.unwrap(), 7);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn test_permanent_errors_are_not_retried() {
		let counter = AtomicU32::new(0);
		let calls = &counter;
		let result: Result<()> = fast_policy(3)
			.run("eth_sendRawTransaction", move || async move {
				calls.fetch_add(1, Ordering::SeqCst);
				Err(OnchainError::Rpc("nonce too low".into()))
			})
			.await;

		assert!(matches!(result, Err(OnchainError::Rpc(_))));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_retries_are_bounded() {
		let counter = AtomicU32::new(0);
		let calls = &counter;
		let result: Result<()> = fast_policy(2)
			.run("eth_getBalance", move || async move {
				calls.fetch_add(1, Ordering::SeqCst);
				Err(OnchainError::Network("timeout".into()))
			})
			.await;

		assert!(matches!(result, Err(OnchainError::Network(_))));
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}
}
