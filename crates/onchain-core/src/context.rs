//! Per-chain components of an account session.

use crate::builder::TransactionBuilder;
use crate::fees::{FeeEstimator, Jitter};
use onchain_account::AccountInterface;
use onchain_chains::{ChainEntry, RetryPolicy};
use onchain_delivery::{create_rpc_delivery, DeliveryConfig, DeliveryService};
use onchain_types::{Address, Chain, ChainClient, FeeConfig};
use std::sync::Arc;

/// Everything an operation needs to act for one account on one chain.
///
/// Rebuilt from scratch whenever the session switches chains.
pub struct ChainContext {
	/// Account label used to prefix log lines.
	pub label: String,
	pub owner: Address,
	pub entry: Arc<ChainEntry>,
	pub client: Arc<dyn ChainClient>,
	pub fees: Arc<FeeEstimator>,
	pub builder: TransactionBuilder,
	pub delivery: DeliveryService,
}

impl ChainContext {
	pub fn new(
		label: impl Into<String>,
		signer: Arc<dyn AccountInterface>,
		entry: Arc<ChainEntry>,
		client: Arc<dyn ChainClient>,
		fee_config: FeeConfig,
		delivery_config: &DeliveryConfig,
		jitter: Arc<dyn Jitter>,
	) -> Self {
		let fees = Arc::new(FeeEstimator::new(
			client.clone(),
			entry.clone(),
			fee_config,
			jitter,
		));
		let builder = TransactionBuilder::new(client.clone(), fees.clone());
		let delivery = DeliveryService::new(
			signer.clone(),
			create_rpc_delivery(client.clone(), delivery_config),
			RetryPolicy::new().with_max_retries(delivery_config.max_retries),
		);

		Self {
			label: label.into(),
			owner: signer.address(),
			entry,
			client,
			fees,
			builder,
			delivery,
		}
	}

	pub fn chain(&self) -> &Chain {
		self.entry.chain()
	}
}
