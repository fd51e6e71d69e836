//! Transaction delivery.
//!
//! The [`DeliveryService`] is the last stage of every state-changing
//! operation: it signs the assembled request with the account key, broadcasts
//! the encoded bytes and blocks until the transaction is mined. Transport
//! failures are retried with bounded exponential backoff; any answer from the
//! node, including a revert, is final.

use async_trait::async_trait;
use onchain_account::AccountInterface;
use onchain_chains::RetryPolicy;
use onchain_types::{
	truncate_hash, Bytes, OnchainError, Result, TransactionReceipt, TransactionRequest, TxHash,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod implementations;
pub mod types;

pub use implementations::rpc::{create_rpc_delivery, RpcDelivery};
pub use types::DeliveryConfig;

/// Broadcasts signed transactions and tracks them until they are mined.
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Broadcasts an encoded transaction and returns the node's hash for it.
	async fn submit(&self, raw: Bytes) -> Result<TxHash>;
	/// Blocks until a receipt is available. There is no timeout at this layer.
	async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TransactionReceipt>;
}

/// Node responses meaning the exact transaction is already in the mempool.
fn is_already_known(err: &OnchainError) -> bool {
	match err {
		OnchainError::Rpc(msg) => {
			let msg = msg.to_lowercase();
			msg.contains("already known") || msg.contains("known transaction")
		}
		_ => false,
	}
}

/// Signing pipeline for one account on one chain.
pub struct DeliveryService {
	account: Arc<dyn AccountInterface>,
	delivery: Box<dyn DeliveryInterface>,
	retry: RetryPolicy,
}

impl DeliveryService {
	pub fn new(
		account: Arc<dyn AccountInterface>,
		delivery: Box<dyn DeliveryInterface>,
		retry: RetryPolicy,
	) -> Self {
		Self {
			account,
			delivery,
			retry,
		}
	}

	/// Signs, broadcasts and waits for `tx` to be mined.
	///
	/// Returns the hash of a successfully executed transaction. A reverted
	/// receipt is a `Submission` error naming the hash.
	pub async fn sign_and_submit(&self, tx: &TransactionRequest) -> Result<TxHash> {
		let signed = self.account.sign_transaction(tx).await?;
		let expected = signed.hash;
		debug!(
			tx_hash = %truncate_hash(&expected),
			nonce = tx.nonce,
			tx_type = tx.fees.tx_type(),
			"Signed transaction"
		);

		let tx_hash = match self
			.retry
			.run("eth_sendRawTransaction", || {
				self.delivery.submit(signed.raw.clone())
			})
			.await
		{
			Ok(hash) => hash,
			// An earlier attempt reached the node before the transport failed.
			Err(e) if is_already_known(&e) => {
				warn!(tx_hash = %truncate_hash(&expected), "Transaction already known to node");
				expected
			}
			Err(e) => return Err(e),
		};
		info!(tx_hash = %truncate_hash(&tx_hash), "Submitted transaction");

		let receipt = self.delivery.wait_for_receipt(&tx_hash).await?;
		if !receipt.success {
			return Err(OnchainError::Submission(format!(
				"transaction {} reverted in block {}",
				tx_hash, receipt.block_number
			)));
		}

		info!(
			tx_hash = %truncate_hash(&tx_hash),
			block = receipt.block_number,
			gas_used = receipt.gas_used,
			"Transaction confirmed"
		);
		Ok(tx_hash)
	}
}
