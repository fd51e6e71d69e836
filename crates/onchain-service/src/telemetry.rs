//! Tracing subscriber setup.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
	/// Filter directive, e.g. `info` or `onchain_core=debug`.
	pub level: String,
	pub json_format: bool,
}

impl Default for TracingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			json_format: false,
		}
	}
}

impl TracingConfig {
	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	pub fn with_json_format(mut self, json: bool) -> Self {
		self.json_format = json;
		self
	}

	fn filter(&self) -> Result<EnvFilter> {
		EnvFilter::try_new(&self.level).map_err(|e| anyhow!("Invalid log level '{}': {}", self.level, e))
	}
}

/// Installs the global subscriber. Logs go to stderr so command output stays clean.
pub fn init_tracing(config: TracingConfig) -> Result<()> {
	let subscriber = tracing_subscriber::registry().with(config.filter()?);

	if config.json_format {
		let json_layer = tracing_subscriber::fmt::layer()
			.json()
			.with_writer(std::io::stderr)
			.with_target(true);
		subscriber
			.with(json_layer)
			.try_init()
			.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;
	} else {
		let fmt_layer = tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.with_target(false);
		subscriber
			.with(fmt_layer)
			.try_init()
			.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_filter_accepts_directives() {
		assert!(TracingConfig::default().with_level("onchain_core=debug,warn").filter().is_ok());
		assert!(TracingConfig::default().with_level("onchain_core=loud").filter().is_err());
	}
}
