//! Approval discovery types.
//!
//! Historical `Approval` events are fetched from an external log index and
//! reduced to `(token, spender)` pairs before any revocation happens.

use crate::chains::ChainId;
use crate::common::{Address, B256};
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw log entry as returned by a block explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLog {
	/// Emitting contract, i.e. the token.
	pub address: Address,
	pub topics: Vec<B256>,
}

/// A token allowance granted to a spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApprovalRecord {
	pub token: Address,
	pub spender: Address,
}

impl ApprovalRecord {
	/// Reads the spender from the third topic of an `Approval(owner, spender, value)` log.
	pub fn from_log(log: &ApprovalLog) -> Option<Self> {
		let spender_word = log.topics.get(2)?;
		Some(Self {
			token: log.address,
			spender: Address::from_word(*spender_word),
		})
	}
}

/// Source of historical `Approval` logs emitted for an owner.
#[async_trait]
pub trait ApprovalLogSource: Send + Sync {
	/// All `Approval` logs whose owner topic is `owner`, from genesis to latest.
	///
	/// Returns `OnchainError::MissingCredential` when the source is not configured.
	async fn approval_logs(&self, chain_id: ChainId, owner: Address) -> Result<Vec<ApprovalLog>>;
}
