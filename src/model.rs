//! Narrow inference seam between the web layer and whatever produces predictions.

use std::fmt;

use crate::error::InferenceError;
use crate::features::FeatureVector;

pub trait RiskModel: Send + Sync {
	fn predict_label(&self, features: &FeatureVector) -> Result<f64, InferenceError>;

	/// One share per class, indexed by label.
	fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
	Low = 0,
	High = 1,
}

impl Risk {
	pub fn from_label(label: f64) -> Result<Self, InferenceError> {
		if label == 0.0 {
			Ok(Risk::Low)
		} else if label == 1.0 {
			Ok(Risk::High)
		} else {
			Err(InferenceError::UnknownLabel(label))
		}
	}

	pub fn class(self) -> usize {
		self as usize
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
	pub risk: Risk,
	/// Probability of `risk`, in [0, 1].
	pub probability: f64,
}

impl fmt::Display for Prediction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let level = match self.risk {
			Risk::Low => "low",
			Risk::High => "high",
		};

		write!(
			f,
			"The model predicts a {} probability ({:.2}%) of heart disease.",
			level,
			self.probability * 100.0
		)
	}
}

pub fn assess(model: &dyn RiskModel, features: &FeatureVector) -> Result<Prediction, InferenceError> {
	let risk = Risk::from_label(model.predict_label(features)?)?;
	let probability = model
		.predict_probabilities(features)?
		.get(risk.class())
		.copied()
		.ok_or(InferenceError::MissingProbability(risk.class()))?;

	Ok(Prediction { risk, probability })
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Fixed(f64, Vec<f64>);

	impl RiskModel for Fixed {
		fn predict_label(&self, _: &FeatureVector) -> Result<f64, InferenceError> {
			Ok(self.0)
		}

		fn predict_probabilities(&self, _: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
			Ok(self.1.clone())
		}
	}

	fn features() -> FeatureVector {
		FeatureVector::new([63.0, 1.0, 3.0, 233.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0])
	}

	#[test]
	fn selects_probability_of_predicted_class() {
		let high = assess(&Fixed(1.0, vec![0.13, 0.87]), &features()).unwrap();
		let low = assess(&Fixed(0.0, vec![0.6, 0.4]), &features()).unwrap();

		assert_eq!(high, Prediction { risk: Risk::High, probability: 0.87 });
		assert_eq!(low, Prediction { risk: Risk::Low, probability: 0.6 });
	}

	#[test]
	fn formats_sentence_with_two_decimals() {
		let high = Prediction { risk: Risk::High, probability: 0.87 };
		let low = Prediction { risk: Risk::Low, probability: 2.0 / 3.0 };
		let certain = Prediction { risk: Risk::Low, probability: 1.0 };

		assert_eq!(high.to_string(), "The model predicts a high probability (87.00%) of heart disease.");
		assert_eq!(low.to_string(), "The model predicts a low probability (66.67%) of heart disease.");
		assert_eq!(certain.to_string(), "The model predicts a low probability (100.00%) of heart disease.");
	}

	#[test]
	fn reports_unknown_label_and_missing_probability() {
		assert_eq!(assess(&Fixed(2.0, vec![0.5, 0.5]), &features()), Err(InferenceError::UnknownLabel(2.0)));
		assert_eq!(assess(&Fixed(1.0, vec![1.0]), &features()), Err(InferenceError::MissingProbability(1)));
	}
}
