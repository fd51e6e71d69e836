//! Configuration for the onchain toolkit.
//!
//! Loads TOML, JSON or YAML files, substitutes `${VAR}` references from the
//! environment, applies `ONCHAIN_*` overrides and validates the result.

use onchain_types::OnchainError;
use thiserror::Error;

pub mod loader;
pub mod types;

pub use loader::{ConfigFormat, ConfigLoader};
pub use types::{AccountConfig, ChainConfig, OnchainConfig, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

impl From<ConfigError> for OnchainError {
	fn from(err: ConfigError) -> Self {
		OnchainError::Config(err.to_string())
	}
}
