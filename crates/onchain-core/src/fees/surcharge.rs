//! Per-chain fees charged on top of execution gas.

use alloy::sol_types::SolCall;
use async_trait::async_trait;
use onchain_types::contracts::IGasPriceOracle;
use onchain_types::{Address, Bytes, Chain, ChainClient, OnchainError, Result, SurchargeKind, U256};
use std::sync::Arc;
use tracing::debug;

/// Extra fee a chain charges for a transaction carrying `data`.
#[async_trait]
pub trait FeeSurcharge: Send + Sync {
	async fn l1_fee(&self, data: &Bytes) -> Result<U256>;
}

/// Chains without a data-publication fee.
pub struct NoSurcharge;

#[async_trait]
impl FeeSurcharge for NoSurcharge {
	async fn l1_fee(&self, _data: &Bytes) -> Result<U256> {
		Ok(U256::ZERO)
	}
}

/// L1 data fee quoted by an OP-stack `GasPriceOracle`.
pub struct OpStackL1Fee {
	client: Arc<dyn ChainClient>,
	oracle: Address,
}

impl OpStackL1Fee {
	pub fn new(client: Arc<dyn ChainClient>, oracle: Address) -> Self {
		Self { client, oracle }
	}
}

#[async_trait]
impl FeeSurcharge for OpStackL1Fee {
	async fn l1_fee(&self, data: &Bytes) -> Result<U256> {
		let call = IGasPriceOracle::getL1FeeCall {
			_data: data.clone(),
		};
		let output = self.client.call(self.oracle, call.abi_encode().into()).await?;
		let fee = IGasPriceOracle::getL1FeeCall::abi_decode_returns(&output)
			.map_err(|e| OnchainError::Decode(format!("getL1Fee: {}", e)))?;
		debug!(oracle = %self.oracle, %fee, "Quoted L1 data fee");
		Ok(fee)
	}
}

/// Factory function to create the surcharge hook for a chain.
pub fn create_surcharge(chain: &Chain, client: Arc<dyn ChainClient>) -> Box<dyn FeeSurcharge> {
	match chain.surcharge_kind() {
		Some(SurchargeKind::OpStack { oracle }) => Box::new(OpStackL1Fee::new(client, oracle)),
		None => Box::new(NoSurcharge),
	}
}
