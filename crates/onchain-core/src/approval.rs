//! Token spending approvals.
//!
//! [`ApprovalManager::ensure_approval`] only spends gas when the live
//! allowance differs from what the caller asked for.
//! [`ApprovalManager::revoke_all`] reconstructs every `(token, spender)` pair
//! the account ever approved from explorer logs and sets each allowance back
//! to zero. One failing pair never stops the others.

use crate::context::ChainContext;
use crate::erc20;
use onchain_types::{
	truncate_hash, Address, Amount, ApprovalLogSource, ApprovalRecord, OnchainError, Result,
	Token, TokenRef, TxHash, U256,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why no approval transaction was needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// Native assets have no allowance.
	NativeToken,
	/// Revocation requested and the allowance is already zero.
	AlreadyRevoked,
	/// The current allowance covers the requested amount.
	SufficientAllowance(U256),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
	Skipped(SkipReason),
	Submitted(TxHash),
}

/// Result of a bulk revocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokeReport {
	/// Set when discovery could not run, e.g. without explorer credentials.
	pub skipped: Option<String>,
	/// Distinct pairs found in the logs.
	pub discovered: usize,
	pub revoked: Vec<(ApprovalRecord, TxHash)>,
	/// Pairs whose allowance was already zero.
	pub unchanged: Vec<ApprovalRecord>,
	pub failed: Vec<(ApprovalRecord, String)>,
}

impl RevokeReport {
	fn skipped(reason: impl Into<String>) -> Self {
		Self {
			skipped: Some(reason.into()),
			..Default::default()
		}
	}

	pub fn is_skipped(&self) -> bool {
		self.skipped.is_some()
	}
}

/// Reconciles allowances of the session account.
pub struct ApprovalManager {
	ctx: Arc<ChainContext>,
	log_source: Arc<dyn ApprovalLogSource>,
}

impl ApprovalManager {
	pub fn new(ctx: Arc<ChainContext>, log_source: Arc<dyn ApprovalLogSource>) -> Self {
		Self { ctx, log_source }
	}

	/// Makes the allowance of `spender` on `token` equal `amount`, unless nothing would change.
	///
	/// Skips when both `amount` and the allowance are zero, or when a non-zero
	/// `amount` is already covered by the allowance.
	pub async fn ensure_approval(
		&self,
		token: TokenRef,
		amount: Amount,
		spender: Address,
	) -> Result<ApprovalOutcome> {
		let token = erc20::resolve_token(self.ctx.client.as_ref(), self.ctx.chain(), token).await?;
		if token.is_native() {
			debug!(account = %self.ctx.label, "Native token needs no approval");
			return Ok(ApprovalOutcome::Skipped(SkipReason::NativeToken));
		}
		let amount = amount.rescale(token.decimals)?.wei();
		self.approve_resolved(&token, amount, spender).await
	}

	async fn approve_resolved(
		&self,
		token: &Token,
		amount: U256,
		spender: Address,
	) -> Result<ApprovalOutcome> {
		let ctx = &self.ctx;
		if token.is_native() {
			return Ok(ApprovalOutcome::Skipped(SkipReason::NativeToken));
		}

		let allowance =
			erc20::allowance(ctx.client.as_ref(), token.address, ctx.owner, spender).await?;
		if amount.is_zero() && allowance.is_zero() {
			debug!(account = %ctx.label, token = %token.symbol, %spender, "Allowance already zero");
			return Ok(ApprovalOutcome::Skipped(SkipReason::AlreadyRevoked));
		}
		if !amount.is_zero() && allowance >= amount {
			debug!(
				account = %ctx.label,
				token = %token.symbol,
				%spender,
				allowance = %token.amount(allowance),
				"Allowance already sufficient"
			);
			return Ok(ApprovalOutcome::Skipped(SkipReason::SufficientAllowance(allowance)));
		}

		let mut tx = ctx
			.builder
			.build_base(ctx.owner, None, Some(token.address))
			.await?
			.with_data(erc20::approve_calldata(spender, amount));
		ctx.builder.estimate_gas_limit(&mut tx).await?;
		let hash = ctx.delivery.sign_and_submit(&tx).await?;

		info!(
			account = %ctx.label,
			amount = %token.amount(amount),
			symbol = %token.symbol,
			%spender,
			tx_hash = %truncate_hash(&hash),
			"Approved spender"
		);
		Ok(ApprovalOutcome::Submitted(hash))
	}

	/// Sets every allowance the account ever granted back to zero.
	///
	/// Without explorer credentials the run is skipped and reported, not failed.
	pub async fn revoke_all(&self) -> Result<RevokeReport> {
		let ctx = &self.ctx;
		let logs = match self
			.log_source
			.approval_logs(ctx.chain().chain_id, ctx.owner)
			.await
		{
			Ok(logs) => logs,
			Err(OnchainError::MissingCredential(what)) => {
				error!(account = %ctx.label, "Missing {}, skipping approval revocation", what);
				return Ok(RevokeReport::skipped(format!("missing {}", what)));
			}
			Err(e) => return Err(e),
		};

		let mut records = BTreeSet::new();
		for log in &logs {
			match ApprovalRecord::from_log(log) {
				Some(record) => {
					records.insert(record);
				}
				None => warn!(
					account = %ctx.label,
					token = %log.address,
					"Skipping malformed Approval log"
				),
			}
		}

		let mut report = RevokeReport {
			discovered: records.len(),
			..Default::default()
		};
		info!(
			account = %ctx.label,
			logs = logs.len(),
			pairs = records.len(),
			"Revoking discovered approvals"
		);

		let mut tokens: HashMap<Address, Token> = HashMap::new();
		for record in records {
			match self.revoke_one(&record, &mut tokens).await {
				Ok(ApprovalOutcome::Submitted(hash)) => report.revoked.push((record, hash)),
				Ok(ApprovalOutcome::Skipped(_)) => report.unchanged.push(record),
				Err(e) => {
					warn!(
						account = %ctx.label,
						token = %record.token,
						spender = %record.spender,
						"Failed to revoke approval: {}",
						e
					);
					report.failed.push((record, e.to_string()));
				}
			}
		}

		Ok(report)
	}

	async fn revoke_one(
		&self,
		record: &ApprovalRecord,
		tokens: &mut HashMap<Address, Token>,
	) -> Result<ApprovalOutcome> {
		let token = match tokens.get(&record.token) {
			Some(token) => token.clone(),
			None => {
				let token = erc20::token_metadata(
					self.ctx.client.as_ref(),
					self.ctx.chain(),
					record.token,
				)
				.await?;
				tokens.insert(record.token, token.clone());
				token
			}
		};
		self.approve_resolved(&token, U256::ZERO, record.spender).await
	}
}
