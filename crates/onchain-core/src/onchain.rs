//! Account session facade.

use crate::approval::{ApprovalManager, ApprovalOutcome, RevokeReport};
use crate::context::ChainContext;
use crate::erc20;
use crate::fees::Jitter;
use crate::transfer::{TransferEngine, TransferReceipt};
use onchain_account::{backfill_address, create_account, AccountInterface};
use onchain_chains::{ChainConnector, ChainEntry};
use onchain_delivery::DeliveryConfig;
use onchain_types::{
	Account, Address, Amount, ApprovalLogSource, Chain, FeeConfig, OnchainError, Result, TokenRef,
	TransferValue, GWEI_DECIMALS, U256,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct OnchainDeps {
	pub connector: Arc<dyn ChainConnector>,
	pub log_source: Arc<dyn ApprovalLogSource>,
	pub fees: FeeConfig,
	pub delivery: DeliveryConfig,
	pub jitter: Arc<dyn Jitter>,
}

/// One account acting on one chain at a time.
pub struct Onchain {
	account: Account,
	signer: Arc<dyn AccountInterface>,
	deps: OnchainDeps,
	ctx: Arc<ChainContext>,
	transfers: TransferEngine,
	approvals: ApprovalManager,
}

impl Onchain {
	/// Opens a session, deriving the account address from its key if needed.
	pub fn new(mut account: Account, entry: Arc<ChainEntry>, deps: OnchainDeps) -> Result<Self> {
		backfill_address(&mut account)?;
		let signer: Arc<dyn AccountInterface> = Arc::from(create_account(&account)?);
		let ctx = Self::context(&account, &signer, entry, &deps)?;

		Ok(Self {
			transfers: TransferEngine::new(ctx.clone()),
			approvals: ApprovalManager::new(ctx.clone(), deps.log_source.clone()),
			account,
			signer,
			deps,
			ctx,
		})
	}

	fn context(
		account: &Account,
		signer: &Arc<dyn AccountInterface>,
		entry: Arc<ChainEntry>,
		deps: &OnchainDeps,
	) -> Result<Arc<ChainContext>> {
		let client = deps.connector.connect(entry.chain(), account)?;
		Ok(Arc::new(ChainContext::new(
			account.label.clone(),
			signer.clone(),
			entry,
			client,
			deps.fees.clone(),
			&deps.delivery,
			deps.jitter.clone(),
		)))
	}

	pub fn account(&self) -> &Account {
		&self.account
	}

	pub fn address(&self) -> Address {
		self.ctx.owner
	}

	pub fn chain(&self) -> &Chain {
		self.ctx.chain()
	}

	/// Switches the session to another chain. The account is kept as is.
	pub fn change_chain(&mut self, entry: Arc<ChainEntry>) -> Result<()> {
		info!(
			account = %self.account.label,
			from = %self.chain().name,
			to = %entry.chain().name,
			"Changing chain"
		);
		let ctx = Self::context(&self.account, &self.signer, entry, &self.deps)?;
		self.transfers = TransferEngine::new(ctx.clone());
		self.approvals = ApprovalManager::new(ctx.clone(), self.deps.log_source.clone());
		self.ctx = ctx;
		Ok(())
	}

	/// Balance of `token` held by `address`, the session account by default.
	pub async fn get_balance(&self, token: TokenRef, address: Option<Address>) -> Result<Amount> {
		let token = erc20::resolve_token(self.ctx.client.as_ref(), self.chain(), token).await?;
		let holder = address.unwrap_or(self.ctx.owner);
		let balance = erc20::balance_of(self.ctx.client.as_ref(), &token, holder).await?;
		Ok(token.amount(balance))
	}

	pub async fn send_token(
		&self,
		to: Address,
		value: TransferValue,
		token: TokenRef,
	) -> Result<TransferReceipt> {
		self.transfers.send(to, value, token).await
	}

	pub async fn approve(
		&self,
		token: TokenRef,
		amount: Amount,
		spender: Address,
	) -> Result<ApprovalOutcome> {
		self.approvals.ensure_approval(token, amount, spender).await
	}

	/// Revokes every approval found in the account's history on the active chain.
	pub async fn remove_approves(&self) -> Result<RevokeReport> {
		self.approvals.revoke_all().await
	}

	/// Current gas price as a 9-decimal amount, i.e. in gwei.
	pub async fn get_gas_price(&self) -> Result<Amount> {
		let price = self.ctx.client.get_gas_price().await?;
		Ok(Amount::from_wei(U256::from(price), GWEI_DECIMALS))
	}

	/// Blocks until the gas price is at or below `limit`.
	///
	/// Polls with a random pause drawn from the configured interval. With a
	/// `deadline` the wait ends in `Timeout` once it elapses.
	pub async fn gas_price_wait(
		&self,
		limit: Amount,
		deadline: Option<Duration>,
	) -> Result<Amount> {
		let wait = async {
			loop {
				let price = self.get_gas_price().await?;
				if price <= limit {
					return Ok(price);
				}
				let [low, high] = self.deps.fees.gas_wait_interval_secs;
				let pause = self.deps.jitter.between(low, high);
				info!(
					account = %self.account.label,
					chain = %self.chain().name,
					"Gas price {} gwei above limit {} gwei, waiting {:.1}s",
					price,
					limit,
					pause
				);
				tokio::time::sleep(Duration::from_secs_f64(pause.max(0.0))).await;
			}
		};

		match deadline {
			Some(deadline) => tokio::time::timeout(deadline, wait).await.map_err(|_| {
				OnchainError::Timeout(format!(
					"gas price on {} stayed above {} gwei for {:?}",
					self.chain().name,
					limit,
					deadline
				))
			})?,
			None => wait.await,
		}
	}

	/// Uncached EIP-1559 probe of the active chain.
	pub async fn is_eip1559(&self) -> Result<bool> {
		self.ctx.fees.is_eip1559().await
	}

	/// Private key at `m/44'/60'/0'/0/{index}` of `phrase`.
	pub fn get_pk_from_seed(phrase: &str, index: u32) -> Result<String> {
		Ok(onchain_account::get_pk_from_seed(phrase, index)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fees::FixedJitter;
	use crate::testing::{owner, MockChain, MockLogSource, ANVIL_KEY};
	use onchain_types::{ChainClient, ChainId, FeeHistory};
	use std::collections::HashMap;

	/// Hands out the same mock client per chain id.
	struct MockConnector {
		clients: HashMap<ChainId, Arc<MockChain>>,
	}

	impl ChainConnector for MockConnector {
		fn connect(&self, chain: &Chain, _account: &Account) -> Result<Arc<dyn ChainClient>> {
			self.clients
				.get(&chain.chain_id)
				.cloned()
				.map(|client| client as Arc<dyn ChainClient>)
				.ok_or_else(|| OnchainError::UnknownChain(chain.name.clone()))
		}
	}

	fn entry(name: &str, chain_id: ChainId) -> Arc<ChainEntry> {
		Arc::new(ChainEntry::new(Chain::new(
			name,
			chain_id,
			"http://localhost",
			"ETH",
		)))
	}

	fn session(clients: &[Arc<MockChain>], account: Account) -> Onchain {
		let clients: HashMap<ChainId, Arc<MockChain>> = clients
			.iter()
			.map(|client| (client.chain_id(), client.clone()))
			.collect();
		let deps = OnchainDeps {
			connector: Arc::new(MockConnector { clients }),
			log_source: Arc::new(MockLogSource::unconfigured()),
			fees: FeeConfig {
				gas_wait_interval_secs: [0.001, 0.001],
				..Default::default()
			},
			delivery: DeliveryConfig {
				receipt_poll_interval_ms: 1,
				max_retries: 0,
			},
			jitter: Arc::new(FixedJitter(0.0)),
		};
		Onchain::new(account, entry("arbitrum", ChainId::ARBITRUM), deps).unwrap()
	}

	fn gwei(value: &str) -> Amount {
		Amount::parse(value, GWEI_DECIMALS).unwrap()
	}

	#[tokio::test]
	async fn test_new_backfills_address() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		let onchain = session(&[client], Account::new("7").with_private_key(ANVIL_KEY));
		assert_eq!(onchain.address(), owner());
		assert_eq!(onchain.account().address, Some(owner()));
	}

	#[tokio::test]
	async fn test_balances_in_token_units() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		*client.native_balance.lock().unwrap() = U256::from(1_500_000_000_000_000_000u64);
		let usdc = Address::repeat_byte(0x0b);
		client.add_token(usdc, "USDC", 6, U256::from(2_500_000u64));
		let onchain = session(&[client], Account::new("7").with_private_key(ANVIL_KEY));

		let native = onchain.get_balance(TokenRef::Native, None).await.unwrap();
		assert_eq!(native.to_string(), "1.5");
		let tokens = onchain
			.get_balance(TokenRef::Contract(usdc), Some(Address::repeat_byte(1)))
			.await
			.unwrap();
		assert_eq!(tokens, Amount::parse("2.5", 6).unwrap());
	}

	#[tokio::test]
	async fn test_gas_price_is_a_gwei_view() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		*client.gas_price.lock().unwrap() = 12_500_000_000;
		let onchain = session(&[client], Account::new("7").with_private_key(ANVIL_KEY));
		assert_eq!(onchain.get_gas_price().await.unwrap(), gwei("12.5"));
	}

	#[tokio::test]
	async fn test_gas_price_wait_returns_once_below_limit() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		client
			.gas_prices
			.lock()
			.unwrap()
			.extend([30_000_000_000, 25_000_000_000]);
		*client.gas_price.lock().unwrap() = 9_000_000_000;
		let onchain = session(&[client.clone()], Account::new("7").with_private_key(ANVIL_KEY));

		let price = onchain.gas_price_wait(gwei("10"), None).await.unwrap();
		assert_eq!(price, gwei("9"));
		assert!(client.gas_prices.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_gas_price_wait_times_out() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		*client.gas_price.lock().unwrap() = 50_000_000_000;
		let onchain = session(&[client], Account::new("7").with_private_key(ANVIL_KEY));

		let err = onchain
			.gas_price_wait(gwei("10"), Some(Duration::from_millis(20)))
			.await
			.unwrap_err();
		assert!(matches!(err, OnchainError::Timeout(_)));
	}

	#[tokio::test]
	async fn test_change_chain_rebuilds_client_and_keeps_account() {
		let arbitrum = Arc::new(MockChain::new(ChainId::ARBITRUM));
		let base = Arc::new(MockChain::new(ChainId::BASE));
		*base.fee_history.lock().unwrap() = FeeHistory {
			base_fee_per_gas: vec![3],
			reward: None,
		};
		let mut onchain = session(
			&[arbitrum.clone(), base.clone()],
			Account::new("7").with_private_key(ANVIL_KEY),
		);

		assert!(!onchain.is_eip1559().await.unwrap());
		onchain.change_chain(entry("base", ChainId::BASE)).unwrap();
		assert_eq!(onchain.chain().name, "base");
		assert_eq!(onchain.address(), owner());
		assert!(onchain.is_eip1559().await.unwrap());
		assert_eq!(arbitrum.fee_history_calls().len(), 1);
		assert_eq!(base.fee_history_calls().len(), 1);

		let err = onchain
			.change_chain(entry("polygon", ChainId::POLYGON))
			.unwrap_err();
		assert!(matches!(err, OnchainError::UnknownChain(_)));
		assert_eq!(onchain.chain().name, "base");
	}

	#[tokio::test]
	async fn test_watch_only_session_reads_but_cannot_send() {
		let client = Arc::new(MockChain::new(ChainId::ARBITRUM));
		*client.native_balance.lock().unwrap() = U256::from(1_000_000u64);
		let onchain = session(
			&[client.clone()],
			Account::new("watch").with_address(owner()),
		);

		assert!(onchain.get_balance(TokenRef::Native, None).await.unwrap() > Amount::zero(18));
		let err = onchain
			.send_token(
				Address::repeat_byte(2),
				TransferValue::Exact(Amount::native(U256::from(1u64))),
				TokenRef::Native,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, OnchainError::Signing(_)));
		assert!(client.sent().is_empty());
	}

	#[test]
	fn test_key_derivation_is_exposed() {
		let key = Onchain::get_pk_from_seed(
			"test test test test test test test test test test test junk",
			0,
		)
		.unwrap();
		assert_eq!(key, ANVIL_KEY);
	}
}
