//! Etherscan v2 compatible `Approval` log source.
//!
//! One `module=logs&action=getLogs` request covers the whole history of the
//! owner (genesis to latest) filtered on the `Approval` topic and the owner
//! in topic 1.

use crate::ExplorerConfig;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use onchain_types::contracts::IERC20;
use onchain_types::{Address, ApprovalLog, ApprovalLogSource, ChainId, OnchainError, Result, B256};
use serde::Deserialize;
use tracing::debug;

const NO_RECORDS: &str = "No records found";

/// Response envelope shared by all explorer endpoints.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
	status: String,
	message: String,
	result: serde_json::Value,
}

fn topic_hex(word: B256) -> String {
	format!("0x{}", hex::encode(word))
}

/// Block-explorer client fetching `Approval` logs.
pub struct EtherscanLogSource {
	client: reqwest::Client,
	base_url: String,
	api_key: Option<String>,
}

impl EtherscanLogSource {
	/// Creates a source for `config`, optionally routing through `proxy`.
	pub fn new(config: &ExplorerConfig, proxy: Option<&str>) -> Result<Self> {
		let mut builder = reqwest::Client::builder();
		if let Some(proxy) = proxy {
			let proxy = reqwest::Proxy::all(proxy)
				.map_err(|e| OnchainError::Config(format!("Invalid proxy: {}", e)))?;
			builder = builder.proxy(proxy);
		}
		let client = builder
			.build()
			.map_err(|e| OnchainError::Config(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: config.base_url.clone(),
			api_key: config.api_key.clone().filter(|key| !key.is_empty()),
		})
	}

	fn parse_result(response: ExplorerResponse) -> Result<Vec<ApprovalLog>> {
		let ExplorerResponse {
			status,
			message,
			result,
		} = response;
		match result {
			serde_json::Value::Array(items) => {
				serde_json::from_value(serde_json::Value::Array(items))
					.map_err(|e| OnchainError::Decode(format!("Malformed explorer logs: {}", e)))
			}
			serde_json::Value::String(text) if text == NO_RECORDS || message == NO_RECORDS => {
				Ok(Vec::new())
			}
			other => Err(OnchainError::Explorer(format!(
				"status {}: {} ({})",
				status, message, other
			))),
		}
	}
}

#[async_trait]
impl ApprovalLogSource for EtherscanLogSource {
	async fn approval_logs(&self, chain_id: ChainId, owner: Address) -> Result<Vec<ApprovalLog>> {
		let api_key = self
			.api_key
			.as_deref()
			.ok_or_else(|| OnchainError::MissingCredential("explorer API key".to_string()))?;

		let chain_id = chain_id.to_string();
		let topic0 = topic_hex(IERC20::Approval::SIGNATURE_HASH);
		let topic1 = topic_hex(owner.into_word());
		let params = [
			("chainid", chain_id.as_str()),
			("module", "logs"),
			("action", "getLogs"),
			("fromBlock", "0"),
			("toBlock", "latest"),
			("topic0", topic0.as_str()),
			("topic0_1_opr", "and"),
			("topic1", topic1.as_str()),
			("apikey", api_key),
		];

		let response = self
			.client
			.get(&self.base_url)
			.query(&params)
			.send()
			.await
			.map_err(|e| OnchainError::Network(format!("Explorer request failed: {}", e)))?;

		let status = response.status();
		if status.is_server_error() {
			return Err(OnchainError::Network(format!("Explorer returned {}", status)));
		}
		if !status.is_success() {
			return Err(OnchainError::Explorer(format!("Explorer returned {}", status)));
		}

		let body: ExplorerResponse = response
			.json()
			.await
			.map_err(|e| OnchainError::Decode(format!("Malformed explorer response: {}", e)))?;
		let logs = Self::parse_result(body)?;
		debug!("Explorer returned {} Approval logs for {}", logs.len(), owner);
		Ok(logs)
	}
}

/// Factory function to create the explorer log source from configuration.
pub fn create_log_source(
	config: &ExplorerConfig,
	proxy: Option<&str>,
) -> Result<Box<dyn ApprovalLogSource>> {
	Ok(Box::new(EtherscanLogSource::new(config, proxy)?))
}
