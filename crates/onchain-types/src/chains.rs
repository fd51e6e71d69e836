//! Chain-related types and traits.

use crate::{
	account::TransactionRequest,
	common::*,
	delivery::TransactionReceipt,
	errors::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const ETHEREUM: Self = Self(1);
	pub const ARBITRUM: Self = Self(42161);
	pub const OPTIMISM: Self = Self(10);
	pub const POLYGON: Self = Self(137);
	pub const BASE: Self = Self(8453);
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(ChainId(s.parse()?))
	}
}

/// GasPriceOracle predeploy shared by OP-stack rollups.
pub const OP_STACK_GAS_PRICE_ORACLE: Address = address!("0x420000000000000000000000000000000000000F");

fn default_op_stack_oracle() -> Address {
	OP_STACK_GAS_PRICE_ORACLE
}

/// Extra per-transaction fee a chain charges on top of execution gas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SurchargeKind {
	/// L1 data-publication fee quoted by an OP-stack `getL1Fee(bytes)` oracle.
	OpStack {
		#[serde(default = "default_op_stack_oracle")]
		oracle: Address,
	},
}

/// Fee market a chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeModel {
	Legacy,
	Eip1559,
}

/// Network identity.
///
/// The fee model is not part of the description. It is detected at runtime
/// and cached by the chain registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
	/// Short chain name used in logs and configuration (`"op"`, `"arbitrum"`...).
	pub name: String,
	pub chain_id: ChainId,
	pub rpc_url: String,
	pub native_symbol: String,
	/// Per-chain safety multiplier applied on top of every randomized multiplier.
	pub multiplier: f64,
	/// Explicitly configured surcharge, see [`Chain::surcharge_kind`].
	pub surcharge: Option<SurchargeKind>,
}

impl Chain {
	pub fn new(
		name: impl Into<String>,
		chain_id: ChainId,
		rpc_url: impl Into<String>,
		native_symbol: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			chain_id,
			rpc_url: rpc_url.into(),
			native_symbol: native_symbol.into(),
			multiplier: 1.0,
			surcharge: None,
		}
	}

	pub fn with_multiplier(mut self, multiplier: f64) -> Self {
		self.multiplier = multiplier;
		self
	}

	pub fn with_surcharge(mut self, surcharge: SurchargeKind) -> Self {
		self.surcharge = Some(surcharge);
		self
	}

	/// Configured surcharge, falling back to the OP-stack oracle for OP Mainnet.
	pub fn surcharge_kind(&self) -> Option<SurchargeKind> {
		if let Some(kind) = &self.surcharge {
			return Some(kind.clone());
		}
		if self.chain_id == ChainId::OPTIMISM || self.name == "op" {
			return Some(SurchargeKind::OpStack {
				oracle: OP_STACK_GAS_PRICE_ORACLE,
			});
		}
		None
	}
}

impl fmt::Display for Chain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.name, self.chain_id)
	}
}

/// Subset of `eth_feeHistory` the fee estimator relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeHistory {
	/// Base fee per block, oldest first; the last entry is the most recent.
	pub base_fee_per_gas: Vec<u128>,
	/// Requested reward percentiles per block.
	pub reward: Option<Vec<Vec<u128>>>,
}

impl FeeHistory {
	/// A chain runs EIP-1559 iff any sampled base fee is non-zero.
	pub fn indicates_eip1559(&self) -> bool {
		self.base_fee_per_gas.iter().any(|fee| *fee != 0)
	}

	pub fn latest_base_fee(&self) -> Option<u128> {
		self.base_fee_per_gas.last().copied()
	}

	/// First reward percentile of each block, zero samples removed.
	pub fn nonzero_priority_samples(&self) -> Vec<u128> {
		self.reward
			.as_deref()
			.unwrap_or_default()
			.iter()
			.filter_map(|block| block.first().copied())
			.filter(|fee| *fee != 0)
			.collect()
	}
}

/// JSON-RPC access to a single chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
	/// Get the chain ID
	fn chain_id(&self) -> ChainId;

	/// Get native balance at the latest block
	async fn get_balance(&self, address: Address) -> Result<U256>;

	/// Get the next nonce for `address`
	async fn get_transaction_count(&self, address: Address) -> Result<u64>;

	/// Get current legacy gas price in wei
	async fn get_gas_price(&self) -> Result<u128>;

	/// Fee history ending at the latest block
	async fn fee_history(&self, block_count: u64, reward_percentiles: &[f64]) -> Result<FeeHistory>;

	/// Estimate gas for a transaction
	async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

	/// Call a contract function (read-only)
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

	/// Broadcast a signed, encoded transaction
	async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash>;

	/// Get transaction receipt, `None` while pending
	async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>>;
}
