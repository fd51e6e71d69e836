//! Chain access for the on-chain toolkit.
//!
//! This crate provides the JSON-RPC implementation of
//! [`onchain_types::ChainClient`] and the [`ChainRegistry`] that tracks the
//! configured networks together with their lazily detected fee model.
//!
//! # Architecture
//!
//! - `registry`: chain entries indexed by chain id and name, each carrying a
//!   once-written fee-model cache
//! - `utils`: retry policy with exponential backoff for transient RPC failures
//! - `implementations`: concrete clients, currently an alloy HTTP client

use onchain_types::{Account, Chain, ChainClient, Result};
use std::sync::Arc;

pub mod implementations;
pub mod registry;
pub mod utils;

pub use implementations::evm::alloy::{AlloyChainClient, AlloyConnector, ChainSchema};
pub use registry::{ChainEntry, ChainRegistry};
pub use utils::RetryPolicy;

/// Builds RPC clients for an account on a chain.
///
/// The account is passed so implementations can route traffic through its proxy.
pub trait ChainConnector: Send + Sync {
	fn connect(&self, chain: &Chain, account: &Account) -> Result<Arc<dyn ChainClient>>;
}
