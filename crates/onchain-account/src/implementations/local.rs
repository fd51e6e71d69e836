//! Local private key wallet.
//!
//! Signs legacy (EIP-155) and EIP-1559 transactions with Alloy's
//! `PrivateKeySigner` and returns the EIP-2718 encoding.

use crate::implementations::watch::WatchOnly;
use crate::{AccountError, AccountInterface, SignedTransaction};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSigner;
use alloy::primitives::TxKind;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use onchain_types::{
	Account, Address, ConfigSchema, FeeFields, Field, FieldType, Schema, TransactionRequest,
	ValidationError,
};

/// Local wallet implementation using Alloy's signer.
pub struct LocalWallet {
	/// The underlying Alloy signer that handles cryptographic operations.
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a new LocalWallet from a hex-encoded private key.
	///
	/// The private key should be provided as a hex string (with or without 0x prefix).
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}
}

/// Validates a hex private key: 32 bytes, optional `0x` prefix.
pub(crate) fn validate_private_key(value: &toml::Value) -> Result<(), String> {
	let key = value.as_str().unwrap_or_default();
	let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

	if key_without_prefix.len() != 64 {
		return Err("Private key must be 64 hex characters (32 bytes)".to_string());
	}

	if hex::decode(key_without_prefix).is_err() {
		return Err("Private key must be valid hexadecimal".to_string());
	}

	Ok(())
}

/// Configuration schema for an `[[accounts]]` entry.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new("label", FieldType::String)],
			// Optional fields
			vec![
				Field::new("private_key", FieldType::String).with_validator(validate_private_key),
				Field::new("address", FieldType::String)
					.with_validator(onchain_types::validate_address),
				Field::new("proxy", FieldType::String),
			],
		);

		schema.validate(config)?;

		let table = config.as_table();
		let has_key = table.is_some_and(|t| t.contains_key("private_key"));
		let has_address = table.is_some_and(|t| t.contains_key("address"));
		if !has_key && !has_address {
			return Err(ValidationError::MissingField(
				"private_key or address".to_string(),
			));
		}
		Ok(())
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(
		&self,
		tx: &TransactionRequest,
	) -> Result<SignedTransaction, AccountError> {
		let to = tx.to.map(TxKind::Call).unwrap_or(TxKind::Create);
		let gas_limit = tx
			.gas
			.ok_or_else(|| AccountError::SigningFailed("gas limit not set".to_string()))?;

		let envelope = match tx.fees {
			FeeFields::Legacy { gas_price } => {
				let mut legacy_tx = TxLegacy {
					chain_id: Some(tx.chain_id.0),
					nonce: tx.nonce,
					gas_price,
					gas_limit,
					to,
					value: tx.value,
					input: tx.data.clone(),
				};
				let signature = self
					.signer
					.sign_transaction(&mut legacy_tx)
					.await
					.map_err(|e| {
						AccountError::SigningFailed(format!("Failed to sign transaction: {}", e))
					})?;
				TxEnvelope::from(legacy_tx.into_signed(signature))
			}
			FeeFields::Eip1559 {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => {
				let mut dynamic_tx = TxEip1559 {
					chain_id: tx.chain_id.0,
					nonce: tx.nonce,
					gas_limit,
					max_fee_per_gas,
					max_priority_fee_per_gas,
					to,
					value: tx.value,
					access_list: Default::default(),
					input: tx.data.clone(),
				};
				let signature = self
					.signer
					.sign_transaction(&mut dynamic_tx)
					.await
					.map_err(|e| {
						AccountError::SigningFailed(format!("Failed to sign transaction: {}", e))
					})?;
				TxEnvelope::from(dynamic_tx.into_signed(signature))
			}
		};

		Ok(SignedTransaction {
			raw: envelope.encoded_2718().into(),
			hash: *envelope.tx_hash(),
		})
	}
}

/// Factory function to create a signer for a managed account.
///
/// Accounts configured without a private key get a [`WatchOnly`] signer.
pub fn create_account(account: &Account) -> Result<Box<dyn AccountInterface>, AccountError> {
	match (account.private_key.as_deref(), account.address) {
		(Some(private_key), _) => Ok(Box::new(LocalWallet::new(private_key)?)),
		(None, Some(address)) => Ok(Box::new(WatchOnly::new(address))),
		(None, None) => Err(AccountError::InvalidKey(format!(
			"account {} has no private key",
			account.label
		))),
	}
}
