use std::path::PathBuf;

use thiserror::Error;

/// A submitted form field was absent or not a number. Deliberately carries no
/// detail about which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid input")]
pub struct InvalidInput;

#[derive(Debug, Error)]
pub enum DatasetError {
	#[error("dataset {} not found", .0.display())]
	NotFound(PathBuf),
	#[error("failed to read dataset {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("dataset {} is empty", .0.display())]
	Empty(PathBuf),
	#[error("a required column was not found in the dataset: '{0}'")]
	MissingColumn(String),
	#[error("line {line}: expected at least {expected} fields, found {found}")]
	ShortRow {
		line: usize,
		expected: usize,
		found: usize,
	},
	#[error("line {line}: column '{column}' has non-numeric value {value:?}")]
	InvalidValue {
		line: usize,
		column: String,
		value: String,
	},
	#[error("line {line}: target must be 0 or 1, found {value}")]
	InvalidTarget {
		line: usize,
		value: f64,
	},
}

#[derive(Debug, Error)]
pub enum ArtifactError {
	#[error("failed to read artifact {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to write artifact {}: {source}", .path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("artifact features {found:?} do not match the expected {expected:?}")]
	Features {
		expected: Vec<String>,
		found: Vec<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
	#[error("model expects {expected} features, got {found}")]
	FeatureCount {
		expected: usize,
		found: usize,
	},
	#[error("model produced unknown label {0}")]
	UnknownLabel(f64),
	#[error("model produced no probability for class {0}")]
	MissingProbability(usize),
}

#[derive(Debug, Error)]
pub enum TrainError {
	#[error(transparent)]
	Dataset(#[from] DatasetError),
	#[error(transparent)]
	Artifact(#[from] ArtifactError),
	#[error("failed to write {}: {source}", .path.display())]
	Output {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid configuration: {0}")]
	Config(String),
}
