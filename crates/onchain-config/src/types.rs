//! Configuration types for the toolkit.

use onchain_delivery::DeliveryConfig;
use onchain_discovery::ExplorerConfig;
use onchain_types::{Account, Address, Chain, ChainId, FeeConfig, SurchargeKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Complete configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OnchainConfig {
	#[serde(default)]
	pub settings: Settings,
	#[serde(default)]
	pub fees: FeeConfig,
	#[serde(default)]
	pub delivery: DeliveryConfig,
	#[serde(default)]
	pub explorer: ExplorerConfig,
	/// Chains keyed by their short name (`op`, `arbitrum`...).
	#[serde(default)]
	pub chains: BTreeMap<String, ChainConfig>,
	#[serde(default)]
	pub accounts: Vec<AccountConfig>,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Default ceiling for `gas-wait`, in gwei.
	#[serde(default)]
	pub gas_price_limit_gwei: Option<Decimal>,
	/// Route RPC traffic through the account proxy as well as explorer traffic.
	#[serde(default)]
	pub use_proxy_for_rpc: bool,
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			log_level: default_log_level(),
			gas_price_limit_gwei: None,
			use_proxy_for_rpc: false,
		}
	}
}

/// Chain-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	pub rpc_url: String,
	pub chain_id: u64,
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	#[serde(default = "default_multiplier")]
	pub multiplier: f64,
	#[serde(default)]
	pub surcharge: Option<SurchargeKind>,
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

fn default_multiplier() -> f64 {
	1.0
}

impl ChainConfig {
	pub fn to_chain(&self, name: &str) -> Chain {
		let chain = Chain::new(name, ChainId(self.chain_id), &self.rpc_url, &self.native_symbol)
			.with_multiplier(self.multiplier);
		match &self.surcharge {
			Some(kind) => chain.with_surcharge(kind.clone()),
			None => chain,
		}
	}
}

/// Managed account entry.
#[derive(Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	pub label: String,
	#[serde(default)]
	pub private_key: Option<String>,
	#[serde(default)]
	pub address: Option<Address>,
	#[serde(default)]
	pub proxy: Option<String>,
}

impl std::fmt::Debug for AccountConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccountConfig")
			.field("label", &self.label)
			.field("address", &self.address)
			.field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
			.field("proxy", &self.proxy.is_some())
			.finish()
	}
}

impl AccountConfig {
	pub fn to_account(&self) -> Account {
		Account {
			label: self.label.clone(),
			address: self.address,
			private_key: self.private_key.clone(),
			proxy: self.proxy.clone(),
		}
	}
}

impl OnchainConfig {
	/// All configured chains as domain values, ordered by name.
	pub fn chain_list(&self) -> Vec<Chain> {
		self.chains
			.iter()
			.map(|(name, chain)| chain.to_chain(name))
			.collect()
	}

	pub fn account(&self, label: &str) -> Option<&AccountConfig> {
		self.accounts.iter().find(|a| a.label == label)
	}

	/// Cross-field rules the schema cannot express.
	pub fn validate(&self) -> Result<(), String> {
		if self.chains.is_empty() {
			return Err("at least one chain must be configured".to_string());
		}

		let mut chain_ids = HashSet::new();
		for (name, chain) in &self.chains {
			if !chain_ids.insert(chain.chain_id) {
				return Err(format!(
					"chain id {} is configured more than once (at '{}')",
					chain.chain_id, name
				));
			}
			if !(chain.multiplier.is_finite() && chain.multiplier > 0.0) {
				return Err(format!("chains.{}.multiplier must be positive", name));
			}
		}

		let [low, high] = self.fees.gas_wait_interval_secs;
		if !(low.is_finite() && high.is_finite() && low >= 0.0 && low <= high) {
			return Err(format!(
				"fees.gas_wait_interval_secs [{}, {}] must be non-negative and ordered",
				low, high
			));
		}

		let mut labels = HashSet::new();
		for account in &self.accounts {
			if !labels.insert(account.label.as_str()) {
				return Err(format!("account label '{}' is used more than once", account.label));
			}
		}

		if let Some(limit) = self.settings.gas_price_limit_gwei {
			if limit.is_sign_negative() {
				return Err("settings.gas_price_limit_gwei must not be negative".to_string());
			}
		}

		Ok(())
	}
}
