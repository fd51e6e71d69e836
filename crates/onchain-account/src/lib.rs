//! Account signing for managed accounts.
//!
//! An [`AccountInterface`] turns an assembled [`TransactionRequest`] into
//! signed, EIP-2718 encoded bytes ready for `eth_sendRawTransaction`.

use async_trait::async_trait;
use onchain_types::{Account, Address, Bytes, OnchainError, TransactionRequest, TxHash};
use thiserror::Error;
use tracing::debug;

pub mod implementations;
pub mod mnemonic;

pub use implementations::local::{create_account, LocalWallet, LocalWalletSchema};
pub use implementations::watch::WatchOnly;
pub use mnemonic::get_pk_from_seed;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Key derivation failed: {0}")]
	Derivation(String),
}

impl From<AccountError> for OnchainError {
	fn from(err: AccountError) -> Self {
		match err {
			AccountError::SigningFailed(msg) => OnchainError::Signing(msg),
			AccountError::InvalidKey(_) | AccountError::Derivation(_) => {
				OnchainError::Config(err.to_string())
			}
		}
	}
}

/// A signed transaction in network encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub raw: Bytes,
	pub hash: TxHash,
}

#[async_trait]
pub trait AccountInterface: Send + Sync {
	fn address(&self) -> Address;
	async fn sign_transaction(
		&self,
		tx: &TransactionRequest,
	) -> Result<SignedTransaction, AccountError>;
}

/// Fills in `account.address` from its private key when it is not configured.
///
/// A configured address that disagrees with the key is rejected.
pub fn backfill_address(account: &mut Account) -> Result<Address, AccountError> {
	let derived = match account.private_key.as_deref() {
		Some(key) => Some(LocalWallet::new(key)?.address()),
		None => None,
	};

	match (account.address, derived) {
		(Some(configured), Some(derived)) if configured != derived => Err(AccountError::InvalidKey(
			format!(
				"account {} is configured as {} but its key controls {}",
				account.label, configured, derived
			),
		)),
		(Some(configured), _) => Ok(configured),
		(None, Some(derived)) => {
			debug!(account = %account.label, "Derived address {}", derived);
			account.address = Some(derived);
			Ok(derived)
		}
		(None, None) => Err(AccountError::InvalidKey(format!(
			"account {} has neither an address nor a private key",
			account.label
		))),
	}
}
