//! Minimal ERC-20 access: metadata, balances, allowances and calldata.

use alloy::sol_types::SolCall;
use onchain_types::contracts::IERC20;
use onchain_types::{
	Address, Bytes, Chain, ChainClient, OnchainError, Result, Token, TokenRef, NATIVE_TOKEN_ADDRESS,
	U256,
};

async fn read<C: SolCall>(client: &dyn ChainClient, token: Address, call: C) -> Result<C::Return> {
	let output = client.call(token, call.abi_encode().into()).await?;
	C::abi_decode_returns(&output)
		.map_err(|e| OnchainError::Decode(format!("{} on {}: {}", C::SIGNATURE, token, e)))
}

/// Reads symbol and decimals of `address`. The native sentinel maps to the chain's asset.
pub async fn token_metadata(
	client: &dyn ChainClient,
	chain: &Chain,
	address: Address,
) -> Result<Token> {
	if address == NATIVE_TOKEN_ADDRESS {
		return Ok(Token::native(chain));
	}
	let symbol = read(client, address, IERC20::symbolCall {}).await?;
	let decimals = read(client, address, IERC20::decimalsCall {}).await?;
	Ok(Token::erc20(symbol, address, chain.chain_id, decimals))
}

/// Turns a caller's token reference into a canonical token on `chain`.
///
/// Already resolved tokens are checked against the chain before any network call.
pub async fn resolve_token(
	client: &dyn ChainClient,
	chain: &Chain,
	token: TokenRef,
) -> Result<Token> {
	match token {
		TokenRef::Native => Ok(Token::native(chain)),
		TokenRef::Contract(address) => token_metadata(client, chain, address).await,
		TokenRef::Resolved(token) => {
			token.ensure_on(chain)?;
			Ok(token)
		}
	}
}

/// Balance of `owner` in minor units of `token`.
pub async fn balance_of(client: &dyn ChainClient, token: &Token, owner: Address) -> Result<U256> {
	if token.is_native() {
		return client.get_balance(owner).await;
	}
	read(client, token.address, IERC20::balanceOfCall { account: owner }).await
}

pub async fn allowance(
	client: &dyn ChainClient,
	token: Address,
	owner: Address,
	spender: Address,
) -> Result<U256> {
	read(client, token, IERC20::allowanceCall { owner, spender }).await
}

pub fn transfer_calldata(to: Address, value: U256) -> Bytes {
	IERC20::transferCall { to, value }.abi_encode().into()
}

pub fn approve_calldata(spender: Address, value: U256) -> Bytes {
	IERC20::approveCall { spender, value }.abi_encode().into()
}
