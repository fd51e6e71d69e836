//! Error types for the on-chain subsystem.

use crate::common::U256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OnchainError>;

#[derive(Error, Debug)]
pub enum OnchainError {
	#[error(
		"Insufficient funds on {chain} for {address}: balance {balance}, fee {fee}, requested {requested}"
	)]
	InsufficientFunds {
		chain: String,
		address: String,
		balance: U256,
		fee: U256,
		requested: U256,
	},

	#[error("Token {token} belongs to chain {token_chain} but the active chain is {active_chain}")]
	CrossChainTokenMismatch {
		token: String,
		token_chain: u64,
		active_chain: u64,
	},

	#[error("Fee estimation failed: {0}")]
	FeeEstimation(String),

	#[error("Gas estimation failed: {reason}")]
	GasEstimation { reason: String },

	#[error("Submission failed: {0}")]
	Submission(String),

	#[error("Missing credential: {0}")]
	MissingCredential(String),

	#[error("Network error: {0}")]
	Network(String),

	#[error("RPC error: {0}")]
	Rpc(String),

	#[error("Decode error: {0}")]
	Decode(String),

	#[error("Signing error: {0}")]
	Signing(String),

	#[error("Explorer error: {0}")]
	Explorer(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Unknown chain: {0}")]
	UnknownChain(String),

	#[error("Timed out: {0}")]
	Timeout(String),
}

impl OnchainError {
	/// Transport level failures may succeed when repeated; everything else is final.
	pub fn is_transient(&self) -> bool {
		matches!(self, OnchainError::Network(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_only_network_errors_are_transient() {
		assert!(OnchainError::Network("connection reset".into()).is_transient());
		assert!(!OnchainError::Rpc("nonce too low".into()).is_transient());
		assert!(!OnchainError::GasEstimation {
			reason: "execution reverted".into()
		}
		.is_transient());
		assert!(!OnchainError::InsufficientFunds {
			chain: "arbitrum".into(),
			address: "0x0".into(),
			balance: U256::from(1),
			fee: U256::from(2),
			requested: U256::from(3),
		}
		.is_transient());
	}

	#[test]
	fn test_insufficient_funds_message_carries_context() {
		let err = OnchainError::InsufficientFunds {
			chain: "op".into(),
			address: "0xabc".into(),
			balance: U256::from(5),
			fee: U256::from(10),
			requested: U256::from(1),
		};
		let message = err.to_string();
		assert!(message.contains("op"));
		assert!(message.contains("0xabc"));
		assert!(message.contains("balance 5"));
		assert!(message.contains("fee 10"));
	}
}
