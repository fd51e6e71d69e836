//! Transaction assembly.

use crate::fees::FeeEstimator;
use onchain_types::{
	Address, Bytes, ChainClient, OnchainError, Result, TransactionRequest, U256,
};
use std::sync::Arc;
use tracing::debug;

/// Assembles unsigned transactions for one chain.
pub struct TransactionBuilder {
	client: Arc<dyn ChainClient>,
	fees: Arc<FeeEstimator>,
}

impl TransactionBuilder {
	pub fn new(client: Arc<dyn ChainClient>, fees: Arc<FeeEstimator>) -> Self {
		Self { client, fees }
	}

	/// Fee fields, a fresh nonce and the chain id, plus optional value and destination.
	///
	/// The gas limit is left unset; see [`TransactionBuilder::estimate_gas_limit`].
	pub async fn build_base(
		&self,
		from: Address,
		value: Option<U256>,
		to: Option<Address>,
	) -> Result<TransactionRequest> {
		let fees = self.fees.compute_fee_fields().await?;
		let nonce = self.client.get_transaction_count(from).await?;

		Ok(TransactionRequest {
			from,
			to,
			nonce,
			chain_id: self.fees.chain().chain_id,
			fees,
			gas: None,
			value: value.unwrap_or_default(),
			data: Bytes::new(),
		})
	}

	/// Node gas estimate for `request` as is, without any multiplier.
	pub async fn estimate_raw(&self, request: &TransactionRequest) -> Result<u64> {
		self.client.estimate_gas(request).await.map_err(|e| match e {
			OnchainError::Rpc(reason) => OnchainError::GasEstimation { reason },
			other => other,
		})
	}

	/// Sets `request.gas` to the node estimate inflated by the safety range.
	pub async fn estimate_gas_limit(&self, request: &mut TransactionRequest) -> Result<u64> {
		let estimate = self.estimate_raw(request).await?;
		let gas = self.fees.gas_limit(estimate);
		debug!(estimate, gas, to = ?request.to, "Estimated gas limit");
		request.gas = Some(gas);
		Ok(gas)
	}
}
