//! `onchain` command-line entry point.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use onchain_chains::{AlloyConnector, ChainRegistry, RetryPolicy};
use onchain_config::{ConfigLoader, OnchainConfig};
use onchain_core::{ApprovalOutcome, Onchain, OnchainDeps, RandomJitter};
use onchain_discovery::create_log_source;
use onchain_types::{Amount, TokenRef, TransferValue, GWEI_DECIMALS, NATIVE_DECIMALS};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod cli;
mod telemetry;

use cli::{Args, Command};
use telemetry::{init_tracing, TracingConfig};

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	// Key derivation needs no configuration file.
	if let Command::DeriveKey { index, mnemonic } = &args.command {
		setup_tracing(&args, None)?;
		let key = Onchain::get_pk_from_seed(mnemonic, *index)?;
		println!("{}", key);
		return Ok(());
	}

	let config = ConfigLoader::new()
		.with_file(&args.config)
		.load()
		.await
		.context("Failed to load configuration")?;
	setup_tracing(&args, Some(&config))?;

	if let Command::Validate = args.command {
		return validate_config(&args, &config);
	}

	let session = open_session(&args, &config)?;
	run(session, args.command, &config).await
}

fn setup_tracing(args: &Args, config: Option<&OnchainConfig>) -> Result<()> {
	let level = args
		.log_level
		.clone()
		.or_else(|| config.map(|c| c.settings.log_level.clone()))
		.unwrap_or_else(|| "info".to_string());
	init_tracing(
		TracingConfig::default()
			.with_level(level)
			.with_json_format(args.json_logs),
	)
}

fn validate_config(args: &Args, config: &OnchainConfig) -> Result<()> {
	info!("Configuration {} is valid", args.config.display());
	for chain in config.chain_list() {
		println!(
			"chain   {:<12} id={:<8} multiplier={} {}",
			chain.name, chain.chain_id.0, chain.multiplier, chain.rpc_url
		);
	}
	for account in &config.accounts {
		let mode = if account.private_key.is_some() { "signing" } else { "watch-only" };
		println!("account {:<12} {}", account.label, mode);
	}
	if config.explorer.api_key.is_none() {
		println!("explorer api key not set, approval revocation is disabled");
	}
	Ok(())
}

/// Builds the session for the selected account and chain.
fn open_session(args: &Args, config: &OnchainConfig) -> Result<Onchain> {
	let account = match &args.account {
		Some(label) => config
			.account(label)
			.ok_or_else(|| anyhow!("Unknown account '{}'", label))?,
		None => config
			.accounts
			.first()
			.ok_or_else(|| anyhow!("No accounts configured"))?,
	}
	.to_account();

	let registry = ChainRegistry::from_chains(config.chain_list())?;
	let chain_name = match &args.chain {
		Some(name) => name.clone(),
		None => config
			.chains
			.keys()
			.next()
			.cloned()
			.ok_or_else(|| anyhow!("No chains configured"))?,
	};
	let entry = registry.by_name(&chain_name)?;

	let retry = RetryPolicy::new().with_max_retries(config.delivery.max_retries);
	let log_source = create_log_source(&config.explorer, account.proxy.as_deref())?;
	let deps = OnchainDeps {
		connector: Arc::new(AlloyConnector::new(config.settings.use_proxy_for_rpc, retry)),
		log_source: Arc::from(log_source),
		fees: config.fees.clone(),
		delivery: config.delivery.clone(),
		jitter: Arc::new(RandomJitter),
	};

	Ok(Onchain::new(account, entry, deps)?)
}

async fn run(session: Onchain, command: Command, config: &OnchainConfig) -> Result<()> {
	match command {
		Command::Balance { token, address } => {
			let balance = session.get_balance(TokenRef::from(token), address).await?;
			println!("{}", balance);
		}
		Command::Send { to, amount, token } => {
			let value = match amount {
				Some(amount) => TransferValue::Exact(Amount::from_decimal(amount, NATIVE_DECIMALS)?),
				None => TransferValue::All,
			};
			let receipt = session.send_token(to, value, TokenRef::from(token)).await?;
			let note = if receipt.corrected { " (corrected)" } else { "" };
			println!("{} sent {}{}", receipt.hash, receipt.amount, note);
		}
		Command::Approve {
			token,
			spender,
			amount,
		} => {
			let amount = Amount::from_decimal(amount, NATIVE_DECIMALS)?;
			match session
				.approve(TokenRef::Contract(token), amount, spender)
				.await?
			{
				ApprovalOutcome::Submitted(hash) => println!("{}", hash),
				ApprovalOutcome::Skipped(reason) => println!("skipped: {:?}", reason),
			}
		}
		Command::RevokeApprovals => {
			let report = session.remove_approves().await?;
			if let Some(reason) = &report.skipped {
				println!("skipped: {}", reason);
				return Ok(());
			}
			for (record, hash) in &report.revoked {
				println!("revoked {} -> {} {}", record.token, record.spender, hash);
			}
			for (record, reason) in &report.failed {
				println!("failed  {} -> {}: {}", record.token, record.spender, reason);
			}
			println!(
				"{} pairs discovered, {} revoked, {} already zero, {} failed",
				report.discovered,
				report.revoked.len(),
				report.unchanged.len(),
				report.failed.len()
			);
			if !report.failed.is_empty() {
				bail!("{} revocations failed", report.failed.len());
			}
		}
		Command::GasPrice => {
			println!("{} gwei", session.get_gas_price().await?);
		}
		Command::GasWait { limit, timeout } => {
			let limit = limit
				.or(config.settings.gas_price_limit_gwei)
				.ok_or_else(|| anyhow!("No gas price limit given and none configured"))?;
			let limit = Amount::from_decimal(limit, GWEI_DECIMALS)?;
			let price = session
				.gas_price_wait(limit, timeout.map(Duration::from_secs))
				.await?;
			println!("{} gwei", price);
		}
		Command::IsEip1559 => {
			println!("{}", session.is_eip1559().await?);
		}
		Command::DeriveKey { .. } | Command::Validate => {}
	}
	Ok(())
}
