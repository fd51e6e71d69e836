//! Token descriptors and the tagged inputs used to refer to them.

use crate::amount::{Amount, NATIVE_DECIMALS};
use crate::chains::{Chain, ChainId};
use crate::common::{address, Address, U256};
use crate::errors::{OnchainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel contract address used for the chain's native asset.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Whether a token is the chain's native asset or an ERC-20 contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	Native,
	Erc20,
}

/// A fully resolved token on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
	pub symbol: String,
	pub address: Address,
	pub chain_id: ChainId,
	pub decimals: u8,
	pub kind: TokenKind,
}

impl Token {
	/// The native asset of `chain`.
	pub fn native(chain: &Chain) -> Self {
		Self {
			symbol: chain.native_symbol.clone(),
			address: NATIVE_TOKEN_ADDRESS,
			chain_id: chain.chain_id,
			decimals: NATIVE_DECIMALS,
			kind: TokenKind::Native,
		}
	}

	pub fn erc20(symbol: impl Into<String>, address: Address, chain_id: ChainId, decimals: u8) -> Self {
		Self {
			symbol: symbol.into(),
			address,
			chain_id,
			decimals,
			kind: TokenKind::Erc20,
		}
	}

	pub fn is_native(&self) -> bool {
		self.kind == TokenKind::Native
	}

	/// Rejects use of this token against a different chain.
	pub fn ensure_on(&self, chain: &Chain) -> Result<()> {
		if self.chain_id != chain.chain_id {
			return Err(OnchainError::CrossChainTokenMismatch {
				token: self.symbol.clone(),
				token_chain: self.chain_id.0,
				active_chain: chain.chain_id.0,
			});
		}
		Ok(())
	}

	/// Wraps a minor-unit value with this token's decimals.
	pub fn amount(&self, wei: U256) -> Amount {
		Amount::from_wei(wei, self.decimals)
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({}) on chain {}", self.symbol, self.address, self.chain_id)
	}
}

/// The ways a caller may name a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRef {
	/// The active chain's native asset.
	Native,
	/// An ERC-20 contract whose metadata still has to be read on chain.
	Contract(Address),
	/// A token whose metadata is already known.
	Resolved(Token),
}

impl From<Token> for TokenRef {
	fn from(token: Token) -> Self {
		TokenRef::Resolved(token)
	}
}

impl From<Option<Address>> for TokenRef {
	fn from(address: Option<Address>) -> Self {
		match address {
			None => TokenRef::Native,
			Some(addr) if addr == NATIVE_TOKEN_ADDRESS => TokenRef::Native,
			Some(addr) => TokenRef::Contract(addr),
		}
	}
}

/// Requested value of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferValue {
	Exact(Amount),
	/// Send the full live balance at request time.
	All,
}
