use std::collections::HashMap;

use crate::error::InvalidInput;

/// Column names in the order the model was trained on.
pub const FEATURES: [&str; 10] = [
	"age", "sex", "cp", "chol", "thalach", "exang", "oldpeak", "slope", "ca", "thal",
];

pub const TARGET: &str = "target";

/// Form captions, index-aligned with `FEATURES`.
pub const LABELS: [&str; 10] = [
	"Age (years)",
	"Sex (1 = male, 0 = female)",
	"Chest pain type (0-3)",
	"Serum cholesterol (mg/dl)",
	"Maximum heart rate achieved",
	"Exercise induced angina (1 = yes, 0 = no)",
	"ST depression induced by exercise",
	"Slope of the peak exercise ST segment (0-2)",
	"Major vessels colored by fluoroscopy (0-4)",
	"Thalassemia (0-3)",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; 10]);

impl FeatureVector {
	pub fn new(values: [f64; 10]) -> Self {
		Self(values)
	}

	/// Reads every feature from submitted form fields. Values are not range checked.
	pub fn from_form(form: &HashMap<String, String>) -> Result<Self, InvalidInput> {
		let mut values = [0.0; 10];

		for (value, name) in values.iter_mut().zip(FEATURES.iter()) {
			*value = form
				.get(*name)
				.and_then(|raw| raw.trim().parse::<f64>().ok())
				.ok_or(InvalidInput)?;
		}

		Ok(Self(values))
	}

	pub fn as_slice(&self) -> &[f64] {
		&self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	const SAMPLE: [(&str, &str); 10] = [
		("age", "63"), ("sex", "1"), ("cp", "3"), ("chol", "233"), ("thalach", "150"),
		("exang", "0"), ("oldpeak", "2.3"), ("slope", "0"), ("ca", "0"), ("thal", "1"),
	];

	#[test]
	fn parses_in_training_order() {
		let mut pairs = SAMPLE.to_vec();
		pairs.reverse();

		let features = FeatureVector::from_form(&form(&pairs)).unwrap();

		assert_eq!(features.as_slice(), &[63.0, 1.0, 3.0, 233.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0]);
	}

	#[test]
	fn tolerates_whitespace_and_extra_fields() {
		let mut pairs = SAMPLE.to_vec();
		pairs[0] = ("age", " 63 ");
		pairs.push(("submit", "Predict"));

		assert_eq!(FeatureVector::from_form(&form(&pairs)).unwrap().as_slice()[0], 63.0);
	}

	#[test]
	fn rejects_missing_field() {
		for skip in 0..SAMPLE.len() {
			let pairs = SAMPLE.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, p)| *p).collect::<Vec<_>>();

			assert_eq!(FeatureVector::from_form(&form(&pairs)), Err(InvalidInput));
		}
	}

	#[test]
	fn rejects_non_numeric_and_empty_values() {
		for bad in ["abc", "", "1,5"] {
			let mut pairs = SAMPLE.to_vec();
			pairs[0] = ("age", bad);

			assert_eq!(FeatureVector::from_form(&form(&pairs)), Err(InvalidInput));
		}
	}

	#[test]
	fn does_not_range_check() {
		let mut pairs = SAMPLE.to_vec();
		pairs[1] = ("sex", "7");

		assert_eq!(FeatureVector::from_form(&form(&pairs)).unwrap().as_slice()[1], 7.0);
	}
}
