//! Configuration loading from files and environment.

use crate::types::OnchainConfig;
use crate::ConfigError;
use onchain_account::LocalWalletSchema;
use onchain_chains::ChainSchema;
use onchain_types::ConfigSchema;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported file formats, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(Self::Toml),
			Some("json") => Ok(Self::Json),
			Some("yaml") | Some("yml") => Ok(Self::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {}",
				path.display()
			))),
		}
	}

	/// Parses `contents` into a TOML value tree so every format shares one
	/// validation path.
	fn parse(self, contents: &str) -> Result<toml::Value, ConfigError> {
		match self {
			Self::Toml => toml::from_str(contents)
				.map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e))),
			Self::Json => {
				let value: serde_json::Value = serde_json::from_str(contents)
					.map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {}", e)))?;
				toml::Value::try_from(value).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			Self::Yaml => {
				let value: serde_yaml::Value = serde_yaml::from_str(contents)
					.map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e)))?;
				toml::Value::try_from(value).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
	/// Replaces the process environment when set.
	env: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ONCHAIN_".to_string(),
			env: None,
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Reads variables from `vars` instead of the process environment.
	pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
		self.env = Some(vars);
		self
	}

	fn var(&self, name: &str) -> Option<String> {
		match &self.env {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		}
	}

	fn prefixed(&self, name: &str) -> Option<String> {
		self.var(&format!("{}{}", self.env_prefix, name))
	}

	pub async fn load(&self) -> Result<OnchainConfig, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		let mut config = self.load_from_file(file_path).await?;
		self.apply_env_overrides(&mut config)?;
		config.validate().map_err(ConfigError::ValidationError)?;

		info!(
			chains = config.chains.len(),
			accounts = config.accounts.len(),
			"Loaded configuration from {}",
			file_path.display()
		);
		Ok(config)
	}

	async fn load_from_file(&self, file_path: &Path) -> Result<OnchainConfig, ConfigError> {
		if !tokio::fs::try_exists(file_path).await.unwrap_or(false) {
			return Err(ConfigError::FileNotFound(file_path.display().to_string()));
		}
		let content = tokio::fs::read_to_string(file_path).await?;
		let format = ConfigFormat::from_path(file_path)?;
		self.parse_str(&content, format)
	}

	/// Substitutes, schema-checks and deserializes `content`.
	pub fn parse_str(&self, content: &str, format: ConfigFormat) -> Result<OnchainConfig, ConfigError> {
		let substituted = self.substitute_env_vars(content)?;
		let value = format.parse(&substituted)?;
		validate_schema(&value)?;
		value
			.try_into()
			.map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let re = Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		let mut result = content.to_string();
		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = self
				.var(var_name)
				.ok_or_else(|| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut OnchainConfig) -> Result<(), ConfigError> {
		if let Some(log_level) = self.prefixed("LOG_LEVEL") {
			config.settings.log_level = log_level;
		}

		if let Some(api_key) = self.prefixed("EXPLORER_API_KEY") {
			debug!("Overriding explorer API key from environment");
			config.explorer.api_key = Some(api_key);
		}

		if let Some(limit) = self.prefixed("GAS_PRICE_LIMIT_GWEI") {
			let limit: Decimal = limit.trim().parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid gas price limit: {}", e))
			})?;
			config.settings.gas_price_limit_gwei = Some(limit);
		}

		for (name, chain) in config.chains.iter_mut() {
			let key = format!("RPC_URL_{}", name.to_uppercase().replace('-', "_"));
			if let Some(url) = self.prefixed(&key) {
				debug!("Overriding RPC URL for chain {} from environment", name);
				chain.rpc_url = url;
			}
		}

		Ok(())
	}
}

/// Runs the per-section schemas over the raw value tree.
fn validate_schema(value: &toml::Value) -> Result<(), ConfigError> {
	let chains = value.get("chains").and_then(|c| c.as_table());
	for (name, chain) in chains.into_iter().flatten() {
		ChainSchema
			.validate(chain)
			.map_err(|e| ConfigError::ValidationError(format!("chains.{}: {}", name, e)))?;
	}

	let accounts = value.get("accounts").and_then(|a| a.as_array());
	for (index, account) in accounts.into_iter().flatten().enumerate() {
		LocalWalletSchema
			.validate(account)
			.map_err(|e| ConfigError::ValidationError(format!("accounts[{}]: {}", index, e)))?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use onchain_types::{ChainId, SurchargeKind};
	use std::io::Write;

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	const BASE_TOML: &str = r#"
[settings]
log_level = "debug"

[fees]
fee_range = [1.0, 1.05]

[explorer]
api_key = "${EXPLORER_KEY}"

[chains.op]
rpc_url = "https://mainnet.optimism.io"
chain_id = 10
multiplier = 1.2

[chains.arbitrum]
rpc_url = "https://arb1.arbitrum.io/rpc"
chain_id = 42161

[[accounts]]
label = "main"
private_key = "${MAIN_KEY}"

[[accounts]]
label = "cold"
address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
"#;

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn base_env() -> HashMap<String, String> {
		env(&[("EXPLORER_KEY", "secret"), ("MAIN_KEY", ANVIL_KEY)])
	}

	fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_substitutes_environment() {
		let file = write_config(".toml", BASE_TOML);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env(base_env())
			.load()
			.await
			.unwrap();

		assert_eq!(config.settings.log_level, "debug");
		assert_eq!(config.explorer.api_key.as_deref(), Some("secret"));
		assert_eq!(config.account("main").unwrap().private_key.as_deref(), Some(ANVIL_KEY));
		assert!(config.account("cold").unwrap().private_key.is_none());
		assert_eq!(config.fees.fee_range.max(), 1.05);

		let chains = config.chain_list();
		assert_eq!(chains.len(), 2);
		let op = chains.iter().find(|c| c.name == "op").unwrap();
		assert_eq!(op.chain_id, ChainId::OPTIMISM);
		assert_eq!(op.multiplier, 1.2);
		assert!(matches!(op.surcharge_kind(), Some(SurchargeKind::OpStack { .. })));
	}

	#[tokio::test]
	async fn test_missing_variable_is_reported() {
		let file = write_config(".toml", BASE_TOML);
		let err = ConfigLoader::new()
			.with_file(file.path())
			.with_env(env(&[("MAIN_KEY", ANVIL_KEY)]))
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "EXPLORER_KEY"));
	}

	#[tokio::test]
	async fn test_env_overrides() {
		let file = write_config(".toml", BASE_TOML);
		let mut vars = base_env();
		vars.extend(env(&[
			("ONCHAIN_LOG_LEVEL", "warn"),
			("ONCHAIN_GAS_PRICE_LIMIT_GWEI", "0.05"),
			("ONCHAIN_RPC_URL_ARBITRUM", "https://arb.example.org"),
		]));

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env(vars)
			.load()
			.await
			.unwrap();

		assert_eq!(config.settings.log_level, "warn");
		assert_eq!(config.settings.gas_price_limit_gwei, Some(Decimal::new(5, 2)));
		assert_eq!(config.chains["arbitrum"].rpc_url, "https://arb.example.org");
		assert_eq!(config.chains["op"].rpc_url, "https://mainnet.optimism.io");
	}

	#[test]
	fn test_rejects_bad_values() {
		let loader = ConfigLoader::new().with_env(base_env());

		let unordered = BASE_TOML.replace("fee_range = [1.0, 1.05]", "fee_range = [1.2, 1.05]");
		assert!(loader.parse_str(&unordered, ConfigFormat::Toml).is_err());

		let bad_multiplier = BASE_TOML.replace("multiplier = 1.2", "multiplier = 0.0");
		let err = loader.parse_str(&bad_multiplier, ConfigFormat::Toml).unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(msg) if msg.starts_with("chains.op")));

		let bad_url = BASE_TOML.replace("https://mainnet.optimism.io", "mainnet.optimism.io");
		assert!(loader.parse_str(&bad_url, ConfigFormat::Toml).is_err());

		let no_credentials = BASE_TOML.replace(
			"address = \"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\"",
			"",
		);
		let err = loader.parse_str(&no_credentials, ConfigFormat::Toml).unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(msg) if msg.starts_with("accounts[1]")));
	}

	#[test]
	fn test_cross_field_rules() {
		let loader = ConfigLoader::new().with_env(base_env());

		let duplicate_id = BASE_TOML.replace("chain_id = 42161", "chain_id = 10");
		let config = loader.parse_str(&duplicate_id, ConfigFormat::Toml).unwrap();
		assert!(config.validate().is_err());

		let duplicate_label = BASE_TOML.replace("label = \"cold\"", "label = \"main\"");
		let config = loader.parse_str(&duplicate_label, ConfigFormat::Toml).unwrap();
		assert!(config.validate().unwrap_err().contains("main"));

		let config = loader.parse_str(BASE_TOML, ConfigFormat::Toml).unwrap();
		assert!(config.validate().is_ok());
	}

	#[tokio::test]
	async fn test_json_and_yaml_formats() {
		let json = r#"{
			"chains": { "base": { "rpc_url": "https://mainnet.base.org", "chain_id": 8453 } },
			"accounts": [ { "label": "main", "private_key": "${MAIN_KEY}" } ]
		}"#;
		let file = write_config(".json", json);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env(base_env())
			.load()
			.await
			.unwrap();
		assert_eq!(config.chains["base"].chain_id, 8453);
		assert_eq!(config.chains["base"].native_symbol, "ETH");

		let yaml = "chains:\n  polygon:\n    rpc_url: https://polygon-rpc.com\n    chain_id: 137\n    native_symbol: POL\n";
		let file = write_config(".yml", yaml);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env(HashMap::new())
			.load()
			.await
			.unwrap();
		assert_eq!(config.chains["polygon"].native_symbol, "POL");
		assert!(config.accounts.is_empty());
	}

	#[tokio::test]
	async fn test_missing_file_and_unknown_extension() {
		let err = ConfigLoader::new()
			.with_file("/nonexistent/onchain.toml")
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::FileNotFound(_)));

		let file = write_config(".ini", BASE_TOML);
		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::ParseError(_)));
	}
}
