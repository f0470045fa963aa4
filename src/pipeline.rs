//! Standardization followed by a random forest, fitted, stored and applied as one unit.
//!
//! Artifact layout (big endian):
//!
//! ```text
//! "HRPL" | version u16 | n u16 | n × (len u16, utf-8 name) | scaler | forest
//! ```

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::info;

use crate::classifier::{invalid_data, Classifier};
use crate::dataset::Dataset;
use crate::error::{ArtifactError, InferenceError};
use crate::features::FeatureVector;
use crate::model::RiskModel;
use crate::random_forest::{RandomForestBuilder, RandomForestClassifier};
use crate::scaler::StandardScaler;

const MAGIC: &[u8; 4] = b"HRPL";
const VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
	features: Vec<String>,
	scaler: StandardScaler,
	forest: RandomForestClassifier,
}

impl Pipeline {
	pub fn new(features: Vec<String>, scaler: StandardScaler, forest: RandomForestClassifier) -> Self {
		Self { features, scaler, forest }
	}

	pub fn fit(features: Vec<String>, dataset: &Dataset, forest: &RandomForestBuilder) -> Self {
		let scaler = StandardScaler::fit(dataset);
		let scaled = scaler.transform_dataset(dataset);
		let forest = forest.fit(scaled.build());

		Self { features, scaler, forest }
	}

	pub fn features(&self) -> &[String] {
		&self.features
	}

	pub fn trees_len(&self) -> usize {
		self.forest.trees_len()
	}

	pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
		self.forest.predict_proba(&self.scaler.transform(x))
	}

	pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
		let mut bytes = Vec::new();
		self.serialize(&mut bytes)?;
		Ok(bytes)
	}

	/// Writes the artifact next to its destination first and renames it into place,
	/// so a failed run never leaves a partial file behind.
	pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
		let write_error = |source| ArtifactError::Write { path: path.to_path_buf(), source };

		let bytes = self.to_bytes().map_err(write_error)?;
		let tmp = temporary_path(path);

		let written = File::create(&tmp)
			.and_then(|mut file| {
				file.write_all(&bytes)?;
				file.sync_all()
			})
			.and_then(|_| fs::rename(&tmp, path));

		if let Err(source) = written {
			let _ = fs::remove_file(&tmp);
			return Err(write_error(source));
		}

		info!(path = %path.display(), bytes = bytes.len(), "artifact written");
		Ok(())
	}

	pub fn load(path: &Path) -> Result<Self, ArtifactError> {
		let read_error = |source| ArtifactError::Read { path: path.to_path_buf(), source };

		let file = File::open(path).map_err(read_error)?;
		Self::deserialize(&mut BufReader::new(file)).map_err(read_error)
	}

	/// Loads an artifact and checks it was trained on exactly `expected`, in that order.
	pub fn load_expecting(path: &Path, expected: &[&str]) -> Result<Self, ArtifactError> {
		let pipeline = Self::load(path)?;

		if pipeline.features.iter().map(String::as_str).ne(expected.iter().copied()) {
			return Err(ArtifactError::Features {
				expected: expected.iter().map(|s| s.to_string()).collect(),
				found: pipeline.features,
			});
		}

		Ok(pipeline)
	}
}

fn temporary_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(".tmp");
	path.with_file_name(name)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> std::io::Result<()> {
	if value.len() > u16::MAX as usize {
		return Err(invalid_data("feature name too long"));
	}

	writer.write_u16::<BigEndian>(value.len() as u16)?;
	writer.write_all(value.as_bytes())
}

fn read_string<R: Read>(reader: &mut R) -> std::io::Result<String> {
	let len = reader.read_u16::<BigEndian>()? as usize;
	let mut buf = vec![0u8; len];
	reader.read_exact(&mut buf)?;

	String::from_utf8(buf).map_err(|e| invalid_data(e.to_string()))
}

impl Classifier for Pipeline {
	fn predict(&self, x: &[f64]) -> f64 {
		self.forest.predict(&self.scaler.transform(x))
	}

	fn features_used(&self) -> usize {
		self.scaler.features_len()
	}

	fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		if self.features.len() > u16::MAX as usize {
			return Err(invalid_data("too many features"));
		}

		writer.write_all(MAGIC)?;
		writer.write_u16::<BigEndian>(VERSION)?;

		writer.write_u16::<BigEndian>(self.features.len() as u16)?;
		for name in &self.features {
			write_string(writer, name)?;
		}

		self.scaler.serialize(writer)?;
		self.forest.serialize(writer)
	}

	fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let mut magic = [0u8; 4];
		reader.read_exact(&mut magic)?;
		if &magic != MAGIC {
			return Err(invalid_data("not a pipeline artifact"));
		}

		let version = reader.read_u16::<BigEndian>()?;
		if version != VERSION {
			return Err(invalid_data(format!("unsupported artifact version {}", version)));
		}

		let len = reader.read_u16::<BigEndian>()?;
		let features = (0..len)
			.map(|_| read_string(reader))
			.collect::<std::io::Result<Vec<String>>>()?;

		let scaler = StandardScaler::deserialize(reader)?;
		let forest = RandomForestClassifier::deserialize(reader)?;

		if scaler.features_len() != features.len() {
			return Err(invalid_data(format!(
				"scaler covers {} features, artifact names {}",
				scaler.features_len(),
				features.len()
			)));
		}

		if forest.features_used() > features.len() {
			return Err(invalid_data(format!(
				"forest splits on feature {} of {}",
				forest.features_used(),
				features.len()
			)));
		}

		Ok(Self { features, scaler, forest })
	}
}

impl Pipeline {
	fn check_len(&self, features: &FeatureVector) -> Result<(), InferenceError> {
		let found = features.as_slice().len();

		if found != self.scaler.features_len() {
			return Err(InferenceError::FeatureCount { expected: self.scaler.features_len(), found });
		}

		Ok(())
	}
}

impl RiskModel for Pipeline {
	fn predict_label(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
		self.check_len(features)?;
		Ok(self.predict(features.as_slice()))
	}

	fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
		self.check_len(features)?;
		Ok(self.predict_proba(features.as_slice()))
	}
}
