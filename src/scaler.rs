use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::classifier::invalid_data;
use crate::dataset::{Builder, Dataset};

/// Standardizes every feature to zero mean and unit variance using statistics
/// captured at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
	mean: Vec<f64>,
	scale: Vec<f64>,
}

impl StandardScaler {
	pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
		Self { mean, scale }
	}

	pub fn fit(dataset: &Dataset) -> Self {
		let n = dataset.rows_len() as f64;
		let mut mean = Vec::with_capacity(dataset.features_len());
		let mut scale = Vec::with_capacity(dataset.features_len());

		for column in 0..dataset.features_len() {
			let m = if n > 0.0 { dataset.column(column).sum::<f64>() / n } else { 0.0 };
			let variance = if n > 0.0 {
				dataset.column(column).map(|x| (x - m).powi(2)).sum::<f64>() / n
			} else {
				0.0
			};

			// Constant features are only centred.
			let std = variance.sqrt();
			mean.push(m);
			scale.push(if std < 10.0 * std::f64::EPSILON { 1.0 } else { std });
		}

		Self { mean, scale }
	}

	pub fn features_len(&self) -> usize {
		self.mean.len()
	}

	pub fn transform(&self, x: &[f64]) -> Vec<f64> {
		x.iter()
			.zip(self.mean.iter().zip(&self.scale))
			.map(|(x, (mean, scale))| (x - mean) / scale)
			.collect()
	}

	pub fn transform_dataset(&self, dataset: &Dataset) -> Builder {
		let mut builder = Builder::new();

		for (row, y) in dataset.rows().zip(dataset.targets()) {
			builder.add(&self.transform(&row), y);
		}

		builder
	}

	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		if self.mean.len() > u16::MAX as usize {
			return Err(invalid_data(format!("{} features do not fit the artifact format", self.mean.len())));
		}

		writer.write_u16::<BigEndian>(self.mean.len() as u16)?;
		for (mean, scale) in self.mean.iter().zip(&self.scale) {
			writer.write_f64::<BigEndian>(*mean)?;
			writer.write_f64::<BigEndian>(*scale)?;
		}

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let len = reader.read_u16::<BigEndian>()? as usize;
		let mut mean = Vec::with_capacity(len);
		let mut scale = Vec::with_capacity(len);

		for _ in 0..len {
			mean.push(reader.read_f64::<BigEndian>()?);

			let s = reader.read_f64::<BigEndian>()?;
			if !(s.is_finite() && s > 0.0) {
				return Err(invalid_data(format!("invalid feature scale {}", s)));
			}
			scale.push(s);
		}

		Ok(Self { mean, scale })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn standardizes_with_population_statistics() {
		let mut builder = Builder::new();
		builder.add(&[1.0, 5.0], 0.0);
		builder.add(&[3.0, 5.0], 1.0);

		let scaler = StandardScaler::fit(&builder.build());

		assert_eq!(scaler, StandardScaler::new(vec![2.0, 5.0], vec![1.0, 1.0]));
		assert_eq!(scaler.transform(&[1.0, 7.0]), vec![-1.0, 2.0]);
	}

	#[test]
	fn transformed_dataset_has_zero_mean() {
		let mut builder = Builder::new();
		for x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
			builder.add(&[*x], 1.0);
		}
		let dataset = builder.build();
		let scaler = StandardScaler::fit(&dataset);

		assert_eq!(scaler.scale, vec![2.0]);

		let scaled = scaler.transform_dataset(&dataset);
		let scaled = scaled.build();
		assert!(scaled.column(0).sum::<f64>().abs() < 1e-12);
		assert_eq!(scaled.targets().count(), 8);
	}

	#[test]
	fn rejects_zero_scale() {
		let mut bytes = Vec::new();
		StandardScaler::new(vec![1.0], vec![0.0]).serialize(&mut bytes).unwrap();

		assert!(StandardScaler::deserialize(&mut bytes.as_slice()).is_err());
	}
}
