//! Fee estimation.
//!
//! The [`FeeEstimator`] detects a chain's fee market once per session,
//! computes the fee fields of every outgoing transaction and inflates gas
//! figures by randomized safety multipliers. All multiplier arithmetic is done
//! in 1e9 fixed point on `U256`, so no fee ever passes through a float.

use onchain_chains::ChainEntry;
use onchain_types::{
	Bytes, Chain, ChainClient, FeeConfig, FeeFields, FeeHistory, FeeModel, MultiplierRange,
	OnchainError, Result, U256,
};
use std::sync::Arc;
use tracing::{debug, info};

pub mod jitter;
pub mod surcharge;

pub use jitter::{FixedJitter, Jitter, RandomJitter};
pub use surcharge::{create_surcharge, FeeSurcharge, NoSurcharge, OpStackL1Fee};

/// Blocks sampled for fee-model detection and EIP-1559 fees.
pub const FEE_HISTORY_BLOCKS: u64 = 20;
/// Blocks sampled by the uncached [`FeeEstimator::is_eip1559`] probe.
pub const EIP1559_PROBE_BLOCKS: u64 = 50;
/// Reward percentile used as the priority fee sample.
pub const PRIORITY_PERCENTILE: f64 = 40.0;

const FIXED_POINT_SCALE: u64 = 1_000_000_000;

/// Upper median of the non-zero priority fee samples, zero without samples.
pub fn median_priority_fee(history: &FeeHistory) -> u128 {
	let mut samples = history.nonzero_priority_samples();
	if samples.is_empty() {
		samples.push(0);
	}
	samples.sort_unstable();
	samples[samples.len() / 2]
}

/// Fee computation for one chain.
pub struct FeeEstimator {
	client: Arc<dyn ChainClient>,
	entry: Arc<ChainEntry>,
	config: FeeConfig,
	jitter: Arc<dyn Jitter>,
	surcharge: Box<dyn FeeSurcharge>,
}

impl FeeEstimator {
	pub fn new(
		client: Arc<dyn ChainClient>,
		entry: Arc<ChainEntry>,
		config: FeeConfig,
		jitter: Arc<dyn Jitter>,
	) -> Self {
		let surcharge = create_surcharge(entry.chain(), client.clone());
		Self {
			client,
			entry,
			config,
			jitter,
			surcharge,
		}
	}

	pub fn chain(&self) -> &Chain {
		self.entry.chain()
	}

	pub fn config(&self) -> &FeeConfig {
		&self.config
	}

	/// Random factor from `range`, scaled by `weight`, in fixed point.
	fn factor(&self, range: &MultiplierRange, weight: f64) -> U256 {
		let drawn = self.jitter.between(range.min(), range.max()) * weight;
		U256::from((drawn * FIXED_POINT_SCALE as f64).round() as u64)
	}

	/// `floor(value × uniform(range) × chain.multiplier)`.
	pub fn multiply(&self, value: U256, range: &MultiplierRange) -> U256 {
		let factor = self.factor(range, self.chain().multiplier);
		value.saturating_mul(factor) / U256::from(FIXED_POINT_SCALE)
	}

	fn multiply_u128(&self, value: u128, range: &MultiplierRange) -> u128 {
		self.multiply(U256::from(value), range).saturating_to()
	}

	/// Gas limit for a node estimate: `ceil(estimate × uniform(safety_range))`.
	///
	/// The chain multiplier prices fees only; a limit below the estimate would
	/// run out of gas, so the estimate is also the floor.
	pub fn gas_limit(&self, estimate: u64) -> u64 {
		let scale = U256::from(FIXED_POINT_SCALE);
		let scaled = U256::from(estimate).saturating_mul(self.factor(&self.config.safety_range, 1.0));
		let limit: u64 = (scaled.saturating_add(scale - U256::from(1u64)) / scale).saturating_to();
		limit.max(estimate)
	}

	/// Cached fee model of the chain, detecting it on first use.
	pub async fn determine_fee_model(&self) -> Result<FeeModel> {
		let mut sample = None;
		self.fee_model_with_sample(&mut sample).await
	}

	/// Detects the model if needed; `sample` receives the history used for detection.
	async fn fee_model_with_sample(&self, sample: &mut Option<FeeHistory>) -> Result<FeeModel> {
		let client = &self.client;
		let chain = self.entry.chain();
		let model = *self
			.entry
			.fee_model_cell()
			.get_or_try_init(move || async move {
				let history = client
					.fee_history(FEE_HISTORY_BLOCKS, &[PRIORITY_PERCENTILE])
					.await?;
				let model = if history.indicates_eip1559() {
					FeeModel::Eip1559
				} else {
					FeeModel::Legacy
				};
				info!(chain = %chain, ?model, "Detected fee model");
				*sample = Some(history);
				Ok::<FeeModel, OnchainError>(model)
			})
			.await?;
		Ok(model)
	}

	/// Fee fields for the next transaction on this chain.
	pub async fn compute_fee_fields(&self) -> Result<FeeFields> {
		let mut sample = None;
		let model = self.fee_model_with_sample(&mut sample).await?;

		match model {
			FeeModel::Legacy => {
				let price = self.client.get_gas_price().await?;
				let gas_price = self.multiply_u128(price, &self.config.fee_range);
				debug!(chain = %self.chain().name, price, gas_price, "Computed legacy fees");
				Ok(FeeFields::Legacy { gas_price })
			}
			FeeModel::Eip1559 => {
				let history = match sample {
					Some(history) => history,
					None => {
						self.client
							.fee_history(FEE_HISTORY_BLOCKS, &[PRIORITY_PERCENTILE])
							.await?
					}
				};
				self.eip1559_fees(&history)
			}
		}
	}

	fn eip1559_fees(&self, history: &FeeHistory) -> Result<FeeFields> {
		let base_fee = history.latest_base_fee().ok_or_else(|| {
			OnchainError::FeeEstimation(format!(
				"{} returned an empty base fee history",
				self.chain().name
			))
		})?;
		let median = median_priority_fee(history);
		let range = &self.config.fee_range;
		let max_priority_fee_per_gas = self.multiply_u128(median, range);
		let max_fee_per_gas =
			self.multiply_u128(base_fee.saturating_add(max_priority_fee_per_gas), range);

		debug!(
			chain = %self.chain().name,
			base_fee,
			median,
			max_fee_per_gas,
			max_priority_fee_per_gas,
			"Computed EIP-1559 fees"
		);
		Ok(FeeFields::Eip1559 {
			max_fee_per_gas,
			max_priority_fee_per_gas,
		})
	}

	/// Uncached probe over a longer window than detection uses.
	pub async fn is_eip1559(&self) -> Result<bool> {
		let history = self
			.client
			.fee_history(EIP1559_PROBE_BLOCKS, &[PRIORITY_PERCENTILE])
			.await?;
		Ok(history.indicates_eip1559())
	}

	/// Chain surcharge for a transaction carrying `data`.
	pub async fn l1_fee(&self, data: &Bytes) -> Result<U256> {
		self.surcharge.l1_fee(data).await
	}
}
