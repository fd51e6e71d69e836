//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use onchain_types::Address;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "onchain")]
#[command(about = "EVM account automation: transfers, approvals and gas", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", env = "ONCHAIN_CONFIG", default_value = "config/onchain.toml")]
	pub config: PathBuf,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long, env = "ONCHAIN_LOG_LEVEL")]
	pub log_level: Option<String>,

	/// Emit logs as JSON lines
	#[arg(long)]
	pub json_logs: bool,

	/// Account label to act as. Defaults to the first configured account.
	#[arg(short, long)]
	pub account: Option<String>,

	/// Chain name to act on. Defaults to the first configured chain.
	#[arg(long)]
	pub chain: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Show a native or ERC-20 balance
	Balance {
		/// Token contract. The native asset when omitted.
		#[arg(long)]
		token: Option<Address>,
		/// Holder. The session account when omitted.
		#[arg(long)]
		address: Option<Address>,
	},

	/// Send native value or tokens
	Send {
		#[arg(long)]
		to: Address,
		/// Amount in whole units. The full balance when omitted.
		#[arg(long)]
		amount: Option<Decimal>,
		#[arg(long)]
		token: Option<Address>,
	},

	/// Set an ERC-20 allowance if it differs from the requested amount
	Approve {
		#[arg(long)]
		token: Address,
		#[arg(long)]
		spender: Address,
		/// Allowance in whole units; 0 revokes.
		#[arg(long)]
		amount: Decimal,
	},

	/// Revoke every allowance found in the account's history
	RevokeApprovals,

	/// Print the current gas price in gwei
	GasPrice,

	/// Block until the gas price drops to a limit
	GasWait {
		/// Limit in gwei. Falls back to `settings.gas_price_limit_gwei`.
		#[arg(long)]
		limit: Option<Decimal>,
		/// Give up after this many seconds
		#[arg(long)]
		timeout: Option<u64>,
	},

	/// Probe whether the chain prices transactions with EIP-1559
	IsEip1559,

	/// Derive a private key from the mnemonic in ONCHAIN_MNEMONIC
	DeriveKey {
		#[arg(long, default_value_t = 0)]
		index: u32,
		#[arg(long, env = "ONCHAIN_MNEMONIC", hide_env_values = true)]
		mnemonic: String,
	},

	/// Validate the configuration file
	Validate,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_send_without_amount_parses() {
		let args = Args::try_parse_from([
			"onchain",
			"--chain",
			"op",
			"send",
			"--to",
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
		])
		.unwrap();
		assert_eq!(args.chain.as_deref(), Some("op"));
		match args.command {
			Command::Send { amount, token, .. } => {
				assert!(amount.is_none());
				assert!(token.is_none());
			}
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_approve_requires_amount() {
		assert!(Args::try_parse_from([
			"onchain",
			"approve",
			"--token",
			"0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
			"--spender",
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
		])
		.is_err());
	}

	#[test]
	fn test_gas_wait_arguments() {
		let args =
			Args::try_parse_from(["onchain", "gas-wait", "--limit", "0.02", "--timeout", "30"]).unwrap();
		match args.command {
			Command::GasWait { limit, timeout } => {
				assert_eq!(limit, Some(Decimal::new(2, 2)));
				assert_eq!(timeout, Some(30));
			}
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_rejects_malformed_address() {
		assert!(Args::try_parse_from(["onchain", "balance", "--address", "0x1234"]).is_err());
	}
}
