//! Approval log discovery.
//!
//! Implementations of [`onchain_types::ApprovalLogSource`] that look up the
//! historical `Approval` events of an owner. Currently an Etherscan v2
//! compatible block-explorer client is provided.

use serde::{Deserialize, Serialize};

pub mod implementations;

pub use implementations::etherscan::{create_log_source, EtherscanLogSource};

/// Default Etherscan v2 multichain endpoint.
pub const DEFAULT_EXPLORER_URL: &str = "https://api.etherscan.io/v2/api";

/// Block-explorer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplorerConfig {
	#[serde(default = "default_base_url")]
	pub base_url: String,
	/// Without a key, approval discovery is skipped.
	#[serde(default)]
	pub api_key: Option<String>,
}

fn default_base_url() -> String {
	DEFAULT_EXPLORER_URL.to_string()
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			base_url: default_base_url(),
			api_key: None,
		}
	}
}
