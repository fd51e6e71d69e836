//! BIP-39 mnemonic key derivation.

use crate::AccountError;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder};

/// Derives the private key at `m/44'/60'/0'/0/{index}` and returns it as `0x` hex.
pub fn get_pk_from_seed(phrase: &str, index: u32) -> Result<String, AccountError> {
	let signer = MnemonicBuilder::<English>::default()
		.phrase(phrase.trim())
		.derivation_path(format!("m/44'/60'/0'/0/{}", index))
		.map_err(|e| AccountError::Derivation(e.to_string()))?
		.build()
		.map_err(|e| AccountError::Derivation(e.to_string()))?;

	Ok(format!("0x{}", hex::encode(signer.to_bytes())))
}
