//! In-memory chain and explorer doubles shared by the unit tests.

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::sol_types::{SolCall, SolInterface};
use async_trait::async_trait;
use onchain_types::contracts::{IGasPriceOracle, IERC20};
use onchain_types::{
	Address, ApprovalLog, ApprovalLogSource, Bytes, ChainClient, ChainId, FeeHistory, OnchainError,
	Result, TransactionReceipt, TransactionRequest, TxHash, B256, OP_STACK_GAS_PRICE_ORACLE, U256,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub(crate) const ANVIL_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub(crate) fn owner() -> Address {
	"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

/// A transaction as the mock node received it.
#[derive(Debug, Clone)]
pub(crate) struct SentTx {
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
	pub gas: u64,
}

struct MockToken {
	symbol: String,
	decimals: u8,
	balance: U256,
	allowances: HashMap<Address, U256>,
}

/// Scriptable chain state answering the ERC-20 and gas oracle calls the core makes.
pub(crate) struct MockChain {
	chain_id: ChainId,
	pub fee_history: Mutex<FeeHistory>,
	pub gas_price: Mutex<u128>,
	/// Prices served before falling back to `gas_price`.
	pub gas_prices: Mutex<VecDeque<u128>>,
	pub l1_fee: Mutex<U256>,
	pub native_balance: Mutex<U256>,
	pub gas_estimate: Mutex<u64>,
	pub estimate_error: Mutex<Option<String>>,
	fee_history_calls: Mutex<Vec<u64>>,
	estimates: Mutex<Vec<TransactionRequest>>,
	tokens: Mutex<HashMap<Address, MockToken>>,
	metadata_reads: Mutex<Vec<(Address, &'static str)>>,
	sent: Mutex<Vec<SentTx>>,
	nonce: Mutex<u64>,
}

impl MockChain {
	pub fn new(chain_id: ChainId) -> Self {
		Self {
			chain_id,
			fee_history: Mutex::new(FeeHistory::default()),
			gas_price: Mutex::new(1),
			gas_prices: Mutex::new(VecDeque::new()),
			l1_fee: Mutex::new(U256::ZERO),
			native_balance: Mutex::new(U256::ZERO),
			gas_estimate: Mutex::new(21_000),
			estimate_error: Mutex::new(None),
			fee_history_calls: Mutex::new(Vec::new()),
			estimates: Mutex::new(Vec::new()),
			tokens: Mutex::new(HashMap::new()),
			metadata_reads: Mutex::new(Vec::new()),
			sent: Mutex::new(Vec::new()),
			nonce: Mutex::new(0),
		}
	}

	pub fn add_token(&self, address: Address, symbol: &str, decimals: u8, balance: U256) {
		self.tokens.lock().unwrap().insert(
			address,
			MockToken {
				symbol: symbol.to_string(),
				decimals,
				balance,
				allowances: HashMap::new(),
			},
		);
	}

	pub fn set_allowance(&self, token: Address, spender: Address, value: U256) {
		if let Some(token) = self.tokens.lock().unwrap().get_mut(&token) {
			token.allowances.insert(spender, value);
		}
	}

	pub fn fee_history_calls(&self) -> Vec<u64> {
		self.fee_history_calls.lock().unwrap().clone()
	}

	pub fn estimates(&self) -> Vec<TransactionRequest> {
		self.estimates.lock().unwrap().clone()
	}

	pub fn sent(&self) -> Vec<SentTx> {
		self.sent.lock().unwrap().clone()
	}

	/// Number of `symbol()` and `decimals()` calls made against `token`.
	pub fn metadata_reads(&self, token: Address) -> (usize, usize) {
		let reads = self.metadata_reads.lock().unwrap();
		let count = |method| {
			reads
				.iter()
				.filter(|(address, name)| *address == token && *name == method)
				.count()
		};
		(count("symbol"), count("decimals"))
	}

	fn erc20_call(&self, to: Address, data: &Bytes) -> Result<Vec<u8>> {
		let tokens = self.tokens.lock().unwrap();
		let token = tokens
			.get(&to)
			.ok_or_else(|| OnchainError::Rpc("execution reverted".to_string()))?;
		let call = IERC20::IERC20Calls::abi_decode(data)
			.map_err(|e| OnchainError::Rpc(format!("execution reverted: {}", e)))?;

		let encoded = match call {
			IERC20::IERC20Calls::symbol(_) => {
				self.metadata_reads.lock().unwrap().push((to, "symbol"));
				IERC20::symbolCall::abi_encode_returns(&token.symbol)
			}
			IERC20::IERC20Calls::decimals(_) => {
				self.metadata_reads.lock().unwrap().push((to, "decimals"));
				IERC20::decimalsCall::abi_encode_returns(&token.decimals)
			}
			IERC20::IERC20Calls::balanceOf(_) => {
				IERC20::balanceOfCall::abi_encode_returns(&token.balance)
			}
			IERC20::IERC20Calls::allowance(call) => {
				let allowance = token
					.allowances
					.get(&call.spender)
					.copied()
					.unwrap_or_default();
				IERC20::allowanceCall::abi_encode_returns(&allowance)
			}
			_ => return Err(OnchainError::Rpc("unexpected eth_call".to_string())),
		};
		Ok(encoded)
	}
}

#[async_trait]
impl ChainClient for MockChain {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn get_balance(&self, _address: Address) -> Result<U256> {
		Ok(*self.native_balance.lock().unwrap())
	}

	async fn get_transaction_count(&self, _address: Address) -> Result<u64> {
		Ok(*self.nonce.lock().unwrap())
	}

	async fn get_gas_price(&self) -> Result<u128> {
		let queued = self.gas_prices.lock().unwrap().pop_front();
		Ok(queued.unwrap_or(*self.gas_price.lock().unwrap()))
	}

	async fn fee_history(&self, block_count: u64, _percentiles: &[f64]) -> Result<FeeHistory> {
		self.fee_history_calls.lock().unwrap().push(block_count);
		Ok(self.fee_history.lock().unwrap().clone())
	}

	async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
		self.estimates.lock().unwrap().push(tx.clone());
		match self.estimate_error.lock().unwrap().clone() {
			Some(reason) => Err(OnchainError::Rpc(reason)),
			None => Ok(*self.gas_estimate.lock().unwrap()),
		}
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
		if to == OP_STACK_GAS_PRICE_ORACLE {
			let fee = *self.l1_fee.lock().unwrap();
			return Ok(IGasPriceOracle::getL1FeeCall::abi_encode_returns(&fee).into());
		}
		self.erc20_call(to, &data).map(Bytes::from)
	}

	async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
		let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
			.map_err(|e| OnchainError::Decode(e.to_string()))?;
		self.sent.lock().unwrap().push(SentTx {
			to: envelope.to(),
			value: envelope.value(),
			data: envelope.input().clone(),
			gas: envelope.gas_limit(),
		});
		*self.nonce.lock().unwrap() += 1;
		Ok(*envelope.tx_hash())
	}

	async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
		Ok(Some(TransactionReceipt {
			hash,
			block_number: 1,
			gas_used: 21_000,
			success: true,
		}))
	}
}

/// Explorer double serving a fixed answer.
pub(crate) struct MockLogSource {
	pub logs: Option<Vec<ApprovalLog>>,
}

impl MockLogSource {
	pub fn with_approvals(approvals: &[(Address, Address)]) -> Self {
		let logs = approvals
			.iter()
			.map(|(token, spender)| ApprovalLog {
				address: *token,
				topics: vec![B256::ZERO, owner().into_word(), spender.into_word()],
			})
			.collect();
		Self { logs: Some(logs) }
	}

	/// Behaves like an explorer without an API key.
	pub fn unconfigured() -> Self {
		Self { logs: None }
	}
}

#[async_trait]
impl ApprovalLogSource for MockLogSource {
	async fn approval_logs(&self, _chain_id: ChainId, _owner: Address) -> Result<Vec<ApprovalLog>> {
		self.logs
			.clone()
			.ok_or_else(|| OnchainError::MissingCredential("explorer API key".to_string()))
	}
}
