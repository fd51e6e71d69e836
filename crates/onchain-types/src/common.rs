//! Common types used throughout the on-chain subsystem.

// Re-export commonly used ethereum types
pub use alloy::primitives::{address, Address, Bytes, B256, U256};

/// Transaction hash
pub type TxHash = B256;

/// Block number
pub type BlockNumber = u64;

/// Shortens a transaction hash for log lines.
pub fn truncate_hash(hash: &TxHash) -> String {
	let hash_str = hex::encode(hash.0);
	if hash_str.len() <= 8 {
		hash_str
	} else {
		format!("{}..", &hash_str[..8])
	}
}
