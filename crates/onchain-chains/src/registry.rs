//! Registry of configured chains.
//!
//! The `ChainRegistry` is the single place where chain descriptions live for a
//! session. Each chain is stored in a [`ChainEntry`] that also owns the
//! fee-model cache: the model is detected at most once per entry and read
//! without locking afterwards.
//!
//! # Thread Safety
//!
//! The registry itself is not thread-safe for registration. Entries are handed
//! out as `Arc<ChainEntry>` and are safe to share across tasks.

use onchain_types::{Chain, ChainId, FeeModel, OnchainError, Result};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::OnceCell;
use tracing::info;

/// A chain together with its session-scoped fee-model cache.
#[derive(Debug)]
pub struct ChainEntry {
	chain: Chain,
	fee_model: OnceCell<FeeModel>,
}

impl ChainEntry {
	pub fn new(chain: Chain) -> Self {
		Self {
			chain,
			fee_model: OnceCell::new(),
		}
	}

	pub fn chain(&self) -> &Chain {
		&self.chain
	}

	/// Cached fee model, `None` until detection has completed once.
	pub fn fee_model(&self) -> Option<FeeModel> {
		self.fee_model.get().copied()
	}

	/// The once-cell backing [`ChainEntry::fee_model`].
	///
	/// Concurrent initialisers are serialised; only the first result is kept.
	pub fn fee_model_cell(&self) -> &OnceCell<FeeModel> {
		&self.fee_model
	}
}

/// Registry for managing configured chains.
///
/// Entries are indexed by chain id; names are unique as well so that CLI and
/// config lookups by name are unambiguous.
pub struct ChainRegistry {
	entries: HashMap<ChainId, Arc<ChainEntry>>,
}

impl ChainRegistry {
	/// Creates a new empty registry.
	pub fn new() -> Self {
		Self {
			entries: HashMap::new(),
		}
	}

	/// Registers a chain and returns its shared entry.
	///
	/// # Errors
	///
	/// Returns an error if a chain with the same id or name is already registered.
	pub fn register(&mut self, chain: Chain) -> Result<Arc<ChainEntry>> {
		info!("Registering chain {}", chain);

		if self.entries.contains_key(&chain.chain_id) {
			return Err(OnchainError::Config(format!(
				"Chain {} already registered",
				chain.chain_id
			)));
		}
		if self.entries.values().any(|e| e.chain.name == chain.name) {
			return Err(OnchainError::Config(format!(
				"Chain name '{}' already registered",
				chain.name
			)));
		}

		let entry = Arc::new(ChainEntry::new(chain));
		self.entries.insert(entry.chain.chain_id, entry.clone());
		Ok(entry)
	}

	pub fn get(&self, chain_id: &ChainId) -> Option<Arc<ChainEntry>> {
		self.entries.get(chain_id).cloned()
	}

	/// Looks a chain up by its configured name.
	pub fn by_name(&self, name: &str) -> Result<Arc<ChainEntry>> {
		self.entries
			.values()
			.find(|e| e.chain.name == name)
			.cloned()
			.ok_or_else(|| OnchainError::UnknownChain(name.to_string()))
	}

	/// All registered chain ids, sorted.
	pub fn chains(&self) -> Vec<ChainId> {
		let mut ids: Vec<ChainId> = self.entries.keys().copied().collect();
		ids.sort();
		ids
	}

	/// Builds a registry from a list of chains.
	pub fn from_chains(chains: impl IntoIterator<Item = Chain>) -> Result<Self> {
		let mut registry = Self::new();
		for chain in chains {
			registry.register(chain)?;
		}
		Ok(registry)
	}
}

impl Default for ChainRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ChainRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChainRegistry")
			.field("chains", &self.chains())
			.finish()
	}
}
