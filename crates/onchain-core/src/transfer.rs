//! Native and ERC-20 transfers.
//!
//! Native transfers are checked against the live balance before anything is
//! signed. When `balance - fee - value` would go negative the value is lowered
//! to `balance - reserve`, where the reserve is the fee inflated once more by
//! the safety range. The corrected value never exceeds the requested one. If
//! even that leaves nothing to send the transfer fails with
//! `InsufficientFunds` and no transaction is built.

use crate::context::ChainContext;
use crate::erc20;
use onchain_types::{
	truncate_hash, Address, Amount, OnchainError, Result, Token, TokenRef, TransactionRequest,
	TransferValue, TxHash, U256,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of the native balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallDecision {
	/// Balance covers the fee and the requested value.
	Sufficient,
	/// Only the contained value can be sent. Never more than requested.
	Corrected(U256),
	Insufficient,
}

impl ShortfallDecision {
	/// Decides what can be sent. `reserve` is only evaluated on a shortfall.
	pub fn evaluate(
		balance: U256,
		fee: U256,
		requested: U256,
		reserve: impl FnOnce() -> U256,
	) -> Self {
		match fee.checked_add(requested) {
			Some(total) if balance >= total => ShortfallDecision::Sufficient,
			_ => match balance.checked_sub(reserve()) {
				Some(corrected) if !corrected.is_zero() => {
					ShortfallDecision::Corrected(corrected.min(requested))
				}
				_ => ShortfallDecision::Insufficient,
			},
		}
	}
}

/// A mined transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
	pub hash: TxHash,
	/// Value actually sent.
	pub amount: Amount,
	/// Whether the value was lowered to fit the balance.
	pub corrected: bool,
}

/// Sends native and ERC-20 value from the session account.
pub struct TransferEngine {
	ctx: Arc<ChainContext>,
}

impl TransferEngine {
	pub fn new(ctx: Arc<ChainContext>) -> Self {
		Self { ctx }
	}

	/// Sends `value` of `token` to `to` and waits for it to be mined.
	pub async fn send(
		&self,
		to: Address,
		value: TransferValue,
		token: TokenRef,
	) -> Result<TransferReceipt> {
		let token = erc20::resolve_token(self.ctx.client.as_ref(), self.ctx.chain(), token).await?;
		if token.is_native() {
			self.send_native(to, value, &token).await
		} else {
			self.send_erc20(to, value, &token).await
		}
	}

	/// Requested value in minor units of `token`, the full balance for `All`.
	fn requested(value: &TransferValue, token: &Token, balance: U256) -> Result<U256> {
		match value {
			TransferValue::Exact(amount) => Ok(amount.rescale(token.decimals)?.wei()),
			TransferValue::All => Ok(balance),
		}
	}

	/// Fee of `tx` with the safety range applied.
	///
	/// Gas is probed with a 1 wei self-transfer rather than the real transfer.
	async fn native_fee(&self, tx: &TransactionRequest) -> Result<U256> {
		let probe = TransactionRequest {
			to: Some(self.ctx.owner),
			value: U256::from(1u64),
			gas: None,
			..tx.clone()
		};
		let probe_gas = self.ctx.builder.estimate_raw(&probe).await?;
		let l1_fee = self.ctx.fees.l1_fee(&tx.data).await?;
		let price = tx.fees.max_price_per_gas();

		let raw = U256::from(probe_gas)
			.saturating_mul(U256::from(price))
			.saturating_add(l1_fee);
		let fee = self
			.ctx
			.fees
			.multiply(raw, &self.ctx.fees.config().safety_range);
		debug!(
			account = %self.ctx.label,
			probe_gas,
			price,
			%l1_fee,
			%fee,
			"Estimated transfer fee"
		);
		Ok(fee)
	}

	async fn send_native(
		&self,
		to: Address,
		value: TransferValue,
		token: &Token,
	) -> Result<TransferReceipt> {
		let ctx = &self.ctx;
		let balance = ctx.client.get_balance(ctx.owner).await?;
		let requested = Self::requested(&value, token, balance)?;

		let mut tx = ctx.builder.build_base(ctx.owner, Some(requested), Some(to)).await?;
		let fee = self.native_fee(&tx).await?;
		let safety = ctx.fees.config().safety_range;
		let decision = ShortfallDecision::evaluate(balance, fee, requested, || {
			ctx.fees.multiply(fee, &safety)
		});

		let corrected = match decision {
			ShortfallDecision::Sufficient => false,
			ShortfallDecision::Corrected(value) if value == requested => false,
			ShortfallDecision::Corrected(value) => {
				warn!(
					account = %ctx.label,
					requested = %token.amount(requested),
					sending = %token.amount(value),
					symbol = %token.symbol,
					"Balance does not cover value and fee, sending the remainder"
				);
				tx.value = value;
				true
			}
			ShortfallDecision::Insufficient => {
				error!(
					account = %ctx.label,
					chain = %ctx.chain().name,
					balance = %token.amount(balance),
					fee = %token.amount(fee),
					symbol = %token.symbol,
					"Insufficient funds for transfer"
				);
				return Err(OnchainError::InsufficientFunds {
					chain: ctx.chain().name.clone(),
					address: ctx.owner.to_string(),
					balance,
					fee,
					requested,
				});
			}
		};

		ctx.builder.estimate_gas_limit(&mut tx).await?;
		let hash = ctx.delivery.sign_and_submit(&tx).await?;
		let amount = token.amount(tx.value);
		info!(
			account = %ctx.label,
			amount = %amount,
			symbol = %token.symbol,
			to = %to,
			tx_hash = %truncate_hash(&hash),
			"Sent native transfer"
		);
		Ok(TransferReceipt {
			hash,
			amount,
			corrected,
		})
	}

	async fn send_erc20(
		&self,
		to: Address,
		value: TransferValue,
		token: &Token,
	) -> Result<TransferReceipt> {
		let ctx = &self.ctx;
		let balance = erc20::balance_of(ctx.client.as_ref(), token, ctx.owner).await?;
		let requested = Self::requested(&value, token, balance)?;

		let corrected = requested > balance;
		let value = if corrected {
			warn!(
				account = %ctx.label,
				requested = %token.amount(requested),
				balance = %token.amount(balance),
				symbol = %token.symbol,
				"Transfer exceeds token balance, sending the full balance"
			);
			balance
		} else {
			requested
		};

		let mut tx = ctx
			.builder
			.build_base(ctx.owner, None, Some(token.address))
			.await?
			.with_data(erc20::transfer_calldata(to, value));
		ctx.builder.estimate_gas_limit(&mut tx).await?;
		let hash = ctx.delivery.sign_and_submit(&tx).await?;

		let amount = token.amount(value);
		info!(
			account = %ctx.label,
			amount = %amount,
			symbol = %token.symbol,
			to = %to,
			tx_hash = %truncate_hash(&hash),
			"Sent token transfer"
		);
		Ok(TransferReceipt {
			hash,
			amount,
			corrected,
		})
	}
}
