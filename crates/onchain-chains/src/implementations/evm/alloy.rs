//! Alloy-based EVM chain client.
//!
//! Talks JSON-RPC over HTTP through alloy's `RootProvider`. The underlying
//! reqwest client can be routed through an account proxy. Read-only calls are
//! retried on transport failures; estimation and submission are not retried
//! here because their callers decide what a failure means.

use crate::{ChainConnector, RetryPolicy};
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::TxKind;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{TransactionInput, TransactionRequest as AlloyTransactionRequest};
use alloy::transports::http::Http;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use onchain_types::{
	truncate_hash, validate_address, validate_http_url, Account, Address, Bytes, Chain, ChainClient,
	ChainId, ConfigSchema, FeeHistory, Field, FieldType, OnchainError, Result, Schema,
	TransactionReceipt, TransactionRequest, TxHash, ValidationError, U256,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Maps an alloy transport error onto the toolkit taxonomy.
///
/// Connection level failures are transient; a JSON-RPC error object is a
/// definitive answer from the node.
pub(crate) fn classify_error(err: TransportError) -> OnchainError {
	match err {
		RpcError::ErrorResp(payload) => OnchainError::Rpc(payload.to_string()),
		RpcError::Transport(kind) => OnchainError::Network(kind.to_string()),
		e @ (RpcError::NullResp | RpcError::DeserError { .. } | RpcError::SerError(_)) => {
			OnchainError::Decode(e.to_string())
		}
		other => OnchainError::Rpc(other.to_string()),
	}
}

/// EVM chain client backed by an alloy HTTP provider.
pub struct AlloyChainClient {
	chain_id: ChainId,
	provider: RootProvider,
	retry: RetryPolicy,
}

impl AlloyChainClient {
	/// Creates a client for `rpc_url`, optionally routing through `proxy`.
	///
	/// No request is made here; connection problems surface on first use.
	pub fn new(
		chain_id: ChainId,
		rpc_url: &str,
		proxy: Option<&str>,
		retry: RetryPolicy,
	) -> Result<Self> {
		let url = rpc_url
			.parse()
			.map_err(|e| OnchainError::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

		let mut builder = reqwest::Client::builder();
		if let Some(proxy) = proxy {
			let proxy = reqwest::Proxy::all(proxy)
				.map_err(|e| OnchainError::Config(format!("Invalid proxy: {}", e)))?;
			builder = builder.proxy(proxy);
		}
		let http_client = builder
			.build()
			.map_err(|e| OnchainError::Config(format!("Failed to create HTTP client: {}", e)))?;

		let transport = Http::with_client(http_client, url);
		let provider = RootProvider::new(RpcClient::new(transport, false));

		info!(
			"Created RPC client for chain {} (proxy: {})",
			chain_id,
			proxy.is_some()
		);

		Ok(Self {
			chain_id,
			provider,
			retry,
		})
	}
}

#[async_trait]
impl ChainClient for AlloyChainClient {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn get_balance(&self, address: Address) -> Result<U256> {
		self.retry
			.run("eth_getBalance", || async {
				self.provider
					.get_balance(address)
					.await
					.map_err(classify_error)
			})
			.await
	}

	async fn get_transaction_count(&self, address: Address) -> Result<u64> {
		self.retry
			.run("eth_getTransactionCount", || async {
				self.provider
					.get_transaction_count(address)
					.await
					.map_err(classify_error)
			})
			.await
	}

	async fn get_gas_price(&self) -> Result<u128> {
		self.retry
			.run("eth_gasPrice", || async {
				self.provider.get_gas_price().await.map_err(classify_error)
			})
			.await
	}

	async fn fee_history(&self, block_count: u64, reward_percentiles: &[f64]) -> Result<FeeHistory> {
		let history = self
			.retry
			.run("eth_feeHistory", || async {
				self.provider
					.get_fee_history(block_count, BlockNumberOrTag::Latest, reward_percentiles)
					.await
					.map_err(classify_error)
			})
			.await?;

		Ok(FeeHistory {
			base_fee_per_gas: history.base_fee_per_gas,
			reward: history.reward,
		})
	}

	async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
		let request: AlloyTransactionRequest = tx.into();
		self.provider
			.estimate_gas(request)
			.await
			.map_err(classify_error)
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
		self.retry
			.run("eth_call", || async {
				let request = AlloyTransactionRequest {
					to: Some(TxKind::Call(to)),
					input: TransactionInput::new(data.clone()),
					..Default::default()
				};
				self.provider.call(request).await.map_err(classify_error)
			})
			.await
	}

	async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
		let pending = self
			.provider
			.send_raw_transaction(&raw)
			.await
			.map_err(classify_error)?;
		let tx_hash = *pending.tx_hash();
		debug!(tx_hash = %truncate_hash(&tx_hash), "Broadcast raw transaction");
		Ok(tx_hash)
	}

	async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
		let receipt = self
			.retry
			.run("eth_getTransactionReceipt", || async {
				self.provider
					.get_transaction_receipt(tx_hash)
					.await
					.map_err(classify_error)
			})
			.await?;

		Ok(receipt.map(|receipt| TransactionReceipt {
			hash: receipt.transaction_hash,
			block_number: receipt.block_number.unwrap_or(0),
			gas_used: receipt.gas_used,
			success: receipt.status(),
		}))
	}
}

/// Connector producing [`AlloyChainClient`]s.
#[derive(Debug, Clone, Default)]
pub struct AlloyConnector {
	/// Route RPC traffic through the account proxy when one is configured.
	pub use_proxy: bool,
	pub retry: RetryPolicy,
}

impl AlloyConnector {
	pub fn new(use_proxy: bool, retry: RetryPolicy) -> Self {
		Self { use_proxy, retry }
	}
}

impl ChainConnector for AlloyConnector {
	fn connect(&self, chain: &Chain, account: &Account) -> Result<Arc<dyn ChainClient>> {
		let proxy = account.proxy.as_deref().filter(|_| self.use_proxy);
		let client = AlloyChainClient::new(chain.chain_id, &chain.rpc_url, proxy, self.retry.clone())?;
		Ok(Arc::new(client))
	}
}

/// Configuration schema for a `[chains.<name>]` table.
pub struct ChainSchema;

impl ConfigSchema for ChainSchema {
	fn validate(&self, config: &toml::Value) -> std::result::Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(validate_http_url),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			// Optional fields
			vec![
				Field::new("native_symbol", FieldType::String),
				Field::new(
					"multiplier",
					FieldType::Float {
						min: Some(0.0),
						max: None,
					},
				)
				.with_validator(|value| {
					let multiplier = value
						.as_float()
						.or_else(|| value.as_integer().map(|i| i as f64))
						.unwrap_or_default();
					if multiplier > 0.0 {
						Ok(())
					} else {
						Err("multiplier must be positive".to_string())
					}
				}),
				Field::new(
					"surcharge",
					FieldType::Table(Schema::new(
						vec![Field::new("kind", FieldType::String)],
						vec![Field::new("oracle", FieldType::String).with_validator(validate_address)],
					)),
				),
			],
		);

		schema.validate(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::{json, Value};
	use std::time::Duration;
	use wiremock::matchers::method;
	use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

	/// Answers every JSON-RPC request with a canned result, echoing the id.
	struct RpcResponder {
		results: Vec<(&'static str, Value)>,
	}

	impl Respond for RpcResponder {
		fn respond(&self, request: &Request) -> ResponseTemplate {
			let body: Value = serde_json::from_slice(&request.body).unwrap();
			let id = body["id"].clone();
			let rpc_method = body["method"].as_str().unwrap_or_default();
			match self.results.iter().find(|(m, _)| *m == rpc_method) {
				Some((_, result)) => ResponseTemplate::new(200)
					.set_body_json(json!({"jsonrpc": "2.0", "id": id, "result": result})),
				None => ResponseTemplate::new(200).set_body_json(json!({
					"jsonrpc": "2.0",
					"id": id,
					"error": {"code": -32000, "message": "execution reverted: not allowed"}
				})),
			}
		}
	}

	async fn client_for(results: Vec<(&'static str, Value)>) -> (MockServer, AlloyChainClient) {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(RpcResponder { results })
			.mount(&server)
			.await;
		let client = AlloyChainClient::new(
			ChainId(10),
			&server.uri(),
			None,
			RetryPolicy::new().with_max_retries(0),
		)
		.unwrap();
		(server, client)
	}

	#[tokio::test]
	async fn test_reads_balance_and_gas_price() {
		let (_server, client) = client_for(vec![
			("eth_getBalance", json!("0xde0b6b3a7640000")),
			("eth_gasPrice", json!("0x3b9aca00")),
			("eth_getTransactionCount", json!("0x5")),
		])
		.await;

		let balance = client.get_balance(Address::repeat_byte(1)).await.unwrap();
		assert_eq!(balance, U256::from(10u64).pow(U256::from(18)));
		assert_eq!(client.get_gas_price().await.unwrap(), 1_000_000_000);
		assert_eq!(
			client
				.get_transaction_count(Address::repeat_byte(1))
				.await
				.unwrap(),
			5
		);
		assert_eq!(client.chain_id(), ChainId(10));
	}

	#[tokio::test]
	async fn test_fee_history_is_mapped() {
		let (_server, client) = client_for(vec![(
			"eth_feeHistory",
			json!({
				"oldestBlock": "0x10",
				"baseFeePerGas": ["0x0", "0x7", "0x9"],
				"gasUsedRatio": [0.5, 0.5],
				"reward": [["0x1"], ["0x2"]]
			}),
		)])
		.await;

		let history = client.fee_history(2, &[40.0]).await.unwrap();
		assert_eq!(history.base_fee_per_gas, vec![0, 7, 9]);
		assert_eq!(history.reward, Some(vec![vec![1], vec![2]]));
	}

	#[tokio::test]
	async fn test_error_response_is_permanent() {
		let (_server, client) = client_for(vec![]).await;
		let err = client
			.call(Address::repeat_byte(2), Bytes::new())
			.await
			.unwrap_err();
		assert!(matches!(err, OnchainError::Rpc(ref msg) if msg.contains("execution reverted")));
		assert!(!err.is_transient());
	}

	#[tokio::test]
	async fn test_unreachable_node_is_transient() {
		// Nothing listens on port 9 of the loopback interface.
		let client = AlloyChainClient::new(
			ChainId(1),
			"http://127.0.0.1:9",
			None,
			RetryPolicy::new()
				.with_max_retries(1)
				.with_initial_interval(Duration::from_millis(1)),
		)
		.unwrap();
		let err = client.get_gas_price().await.unwrap_err();
		assert!(err.is_transient(), "unexpected error: {err}");
	}

	#[test]
	fn test_invalid_url_and_proxy_rejected() {
		assert!(matches!(
			AlloyChainClient::new(ChainId(1), "not a url", None, RetryPolicy::new()),
			Err(OnchainError::Config(_))
		));
		assert!(matches!(
			AlloyChainClient::new(
				ChainId(1),
				"http://localhost:8545",
				Some("http://[invalid"),
				RetryPolicy::new()
			),
			Err(OnchainError::Config(_))
		));
	}

	#[test]
	fn test_chain_schema() {
		let valid: toml::Value = toml::from_str(
			r#"
rpc_url = "https://arb1.arbitrum.io/rpc"
chain_id = 42161
native_symbol = "ETH"
multiplier = 1.2
"#,
		)
		.unwrap();
		assert!(ChainSchema.validate(&valid).is_ok());

		let zero_multiplier: toml::Value =
			toml::from_str("rpc_url = \"https://x\"\nchain_id = 1\nmultiplier = 0.0").unwrap();
		assert!(ChainSchema.validate(&zero_multiplier).is_err());

		let missing_rpc: toml::Value = toml::from_str("chain_id = 1").unwrap();
		assert!(matches!(
			ChainSchema.validate(&missing_rpc),
			Err(ValidationError::MissingField(_))
		));
	}
}
