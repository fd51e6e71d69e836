//! Address-only accounts.

use crate::{AccountError, AccountInterface, SignedTransaction};
use async_trait::async_trait;
use onchain_types::{Address, TransactionRequest};

/// An account known only by its address. Reads work, signing is refused.
pub struct WatchOnly {
	address: Address,
}

impl WatchOnly {
	pub fn new(address: Address) -> Self {
		Self { address }
	}
}

#[async_trait]
impl AccountInterface for WatchOnly {
	fn address(&self) -> Address {
		self.address
	}

	async fn sign_transaction(
		&self,
		_tx: &TransactionRequest,
	) -> Result<SignedTransaction, AccountError> {
		Err(AccountError::SigningFailed(format!(
			"{} is watch-only, no private key configured",
			self.address
		)))
	}
}
