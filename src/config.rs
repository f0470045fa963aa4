//! Run configuration for the trainer and the web front end.
//!
//! Every value has a default, so `heart-risk fit` followed by `heart-risk serve`
//! works from a directory holding `heart.csv`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use crate::error::TrainError;
use crate::node::MAX_SERIALIZED_DEPTH;
use crate::random_forest::RandomForestBuilder;

pub const DEFAULT_DATASET: &str = "heart.csv";
pub const DEFAULT_ARTIFACT: &str = "heart_pipeline.bin";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Forest hyper parameters
#[derive(Debug, Clone, PartialEq, Args)]
pub struct ForestConfig {
	/// Number of trees in the forest
	#[arg(long, default_value_t = 100)]
	pub trees: usize,

	/// Maximum depth of every tree
	#[arg(long, default_value_t = 32)]
	pub max_depth: usize,

	/// Bootstrap sample size as a share of the training rows
	#[arg(long, default_value_t = 1.0)]
	pub bag_amount: f64,

	/// Seed for bootstrapping and feature sampling
	#[arg(long, default_value_t = 42)]
	pub seed: u64,
}

impl Default for ForestConfig {
	fn default() -> Self {
		Self {
			trees: 100,
			max_depth: 32,
			bag_amount: 1.0,
			seed: 42,
		}
	}
}

impl From<&ForestConfig> for RandomForestBuilder {
	fn from(config: &ForestConfig) -> Self {
		Self {
			n_trees: config.trees,
			max_depth: config.max_depth,
			bag_amount: config.bag_amount,
			seed: config.seed,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct TrainConfig {
	/// Labelled CSV dataset
	#[arg(long, default_value = DEFAULT_DATASET)]
	pub dataset: PathBuf,

	/// Where to write the fitted pipeline
	#[arg(long, env = "HEART_RISK_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
	pub artifact: PathBuf,

	/// Share of rows held out to report test accuracy, 0 trains on everything
	#[arg(long, default_value_t = 0.0)]
	pub test_rate: f64,

	#[command(flatten)]
	pub forest: ForestConfig,
}

impl Default for TrainConfig {
	fn default() -> Self {
		Self {
			dataset: PathBuf::from(DEFAULT_DATASET),
			artifact: PathBuf::from(DEFAULT_ARTIFACT),
			test_rate: 0.0,
			forest: ForestConfig::default(),
		}
	}
}

impl TrainConfig {
	pub fn validate(&self) -> Result<(), TrainError> {
		if self.forest.trees == 0 || self.forest.trees > u16::MAX as usize {
			return Err(TrainError::Config(format!("trees must be between 1 and {}, got {}", u16::MAX, self.forest.trees)));
		}
		if self.forest.max_depth > MAX_SERIALIZED_DEPTH {
			return Err(TrainError::Config(format!("max depth must be at most {}, got {}", MAX_SERIALIZED_DEPTH, self.forest.max_depth)));
		}
		if !(self.forest.bag_amount > 0.0 && self.forest.bag_amount <= 1.0) {
			return Err(TrainError::Config(format!("bag amount must be in (0, 1], got {}", self.forest.bag_amount)));
		}
		if !(0.0..1.0).contains(&self.test_rate) {
			return Err(TrainError::Config(format!("test rate must be in [0, 1), got {}", self.test_rate)));
		}

		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct EvaluateConfig {
	/// Unlabelled CSV dataset to score
	#[arg(long)]
	pub dataset: PathBuf,

	/// Fitted pipeline
	#[arg(long, env = "HEART_RISK_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
	pub artifact: PathBuf,

	/// Output file, one `label,probability` line per row
	#[arg(long)]
	pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct ServeConfig {
	/// Fitted pipeline loaded at startup
	#[arg(long, env = "HEART_RISK_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
	pub artifact: PathBuf,

	/// Address to listen on
	#[arg(long, env = "HEART_RISK_BIND", default_value = DEFAULT_BIND)]
	pub bind: SocketAddr,
}

impl Default for ServeConfig {
	fn default() -> Self {
		Self {
			artifact: PathBuf::from(DEFAULT_ARTIFACT),
			bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
		}
	}
}
