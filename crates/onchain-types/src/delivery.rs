//! Transaction delivery types.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring, including transaction receipts.

use crate::common::{BlockNumber, TxHash};
use serde::{Deserialize, Serialize};

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a block,
/// including its success status and block number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TxHash,
	/// The block number where the transaction was included.
	pub block_number: BlockNumber,
	/// Gas consumed by execution.
	pub gas_used: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}
