//! Core transaction logic of the on-chain toolkit.
//!
//! This crate turns the lower layers (chain clients, signing, delivery and
//! log discovery) into the operations an account session performs.
//!
//! # Architecture
//!
//! - `fees`: fee-model detection, fee fields, randomized safety multipliers
//!   and per-chain L1 surcharges
//! - `builder`: unsigned transaction assembly and gas limits
//! - `transfer`: native transfers with shortfall correction, token transfers
//! - `approval`: allowance reconciliation and bulk revocation
//! - `onchain`: the [`Onchain`] session facade tying everything together
//!
//! Every state-changing operation follows the same path: resolve the token,
//! consult the [`FeeEstimator`], build with the [`TransactionBuilder`] and hand
//! the request to the delivery pipeline.

pub mod approval;
pub mod builder;
pub mod context;
pub mod erc20;
pub mod fees;
pub mod onchain;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{ApprovalManager, ApprovalOutcome, RevokeReport, SkipReason};
pub use builder::TransactionBuilder;
pub use context::ChainContext;
pub use fees::{FeeEstimator, FixedJitter, Jitter, RandomJitter};
pub use onchain::{Onchain, OnchainDeps};
pub use onchain_account::get_pk_from_seed;
pub use transfer::{ShortfallDecision, TransferEngine, TransferReceipt};
