//! RPC delivery using a [`ChainClient`] for submission and receipt polling.
//!
//! Transport retries belong to the client; every poll here is a single call.

use crate::{types::DeliveryConfig, DeliveryInterface};
use async_trait::async_trait;
use onchain_types::{
	truncate_hash, Bytes, ChainClient, Result, TransactionReceipt, TxHash,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Submits raw transactions through the chain's RPC endpoint.
pub struct RpcDelivery {
	client: Arc<dyn ChainClient>,
	poll_interval: Duration,
}

impl RpcDelivery {
	pub fn new(client: Arc<dyn ChainClient>, config: &DeliveryConfig) -> Self {
		Self {
			client,
			poll_interval: config.poll_interval(),
		}
	}
}

#[async_trait]
impl DeliveryInterface for RpcDelivery {
	async fn submit(&self, raw: Bytes) -> Result<TxHash> {
		self.client.send_raw_transaction(raw).await
	}

	async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TransactionReceipt> {
		let hash = *hash;
		debug!(tx_hash = %truncate_hash(&hash), "Waiting for receipt");

		loop {
			if let Some(receipt) = self.client.get_transaction_receipt(hash).await? {
				return Ok(receipt);
			}
			tokio::time::sleep(self.poll_interval).await;
		}
	}
}

/// Factory function to create an RPC delivery for a chain client.
pub fn create_rpc_delivery(
	client: Arc<dyn ChainClient>,
	config: &DeliveryConfig,
) -> Box<dyn DeliveryInterface> {
	Box::new(RpcDelivery::new(client, config))
}
