//! Offline side: fit a pipeline from a labelled dataset, or score an unlabelled one.

use std::fs::File;
use std::io::{BufWriter, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::{EvaluateConfig, TrainConfig};
use crate::error::TrainError;
use crate::features::FEATURES;
use crate::functions::argmax;
use crate::heart_data;
use crate::pipeline::Pipeline;
use crate::random_forest::RandomForestBuilder;

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
	pub train_rows: usize,
	pub test_rows: usize,
	pub train_rate: f64,
	/// Accuracy on the held out rows, when any were held out.
	pub test_rate: Option<f64>,
}

pub fn fit_pipeline(config: &TrainConfig) -> Result<(Pipeline, FitReport), TrainError> {
	config.validate()?;

	info!(path = %config.dataset.display(), "reading dataset");
	let builder = heart_data::read(&config.dataset)?;
	let dataset = builder.build();

	let mut rng = StdRng::seed_from_u64(config.forest.seed);
	let (train, test) = dataset.train_test_split(&mut rng, config.test_rate);
	info!(train = train.rows_len(), test = test.rows_len(), "split dataset");
	if train.rows_len() == 0 {
		return Err(TrainError::Config(format!(
			"test rate {} leaves no rows to train on out of {}",
			config.test_rate,
			test.rows_len()
		)));
	}

	info!(trees = config.forest.trees, depth = config.forest.max_depth, "fitting pipeline");
	let features = FEATURES.iter().map(|s| s.to_string()).collect();
	let pipeline = Pipeline::fit(features, &train, &RandomForestBuilder::from(&config.forest));

	let report = FitReport {
		train_rows: train.rows_len(),
		test_rows: test.rows_len(),
		train_rate: train.evaluate(&pipeline),
		test_rate: if test.rows_len() > 0 { Some(test.evaluate(&pipeline)) } else { None },
	};

	info!("classification rate train: {:.3}%", report.train_rate * 100.0);
	if let Some(rate) = report.test_rate {
		info!("classification rate test: {:.3}%", rate * 100.0);
	}

	Ok((pipeline, report))
}

/// Full training run. Nothing is written unless every step succeeds.
pub fn fit(config: &TrainConfig) -> Result<FitReport, TrainError> {
	let (pipeline, report) = fit_pipeline(config)?;

	info!(path = %config.artifact.display(), "serializing pipeline");
	pipeline.save(&config.artifact)?;
	info!(trees = pipeline.trees_len(), rows = report.train_rows, "training complete");

	Ok(report)
}

/// Scores every row of an unlabelled dataset, writing `label,probability` lines.
pub fn evaluate(config: &EvaluateConfig) -> Result<usize, TrainError> {
	info!(path = %config.artifact.display(), "loading pipeline");
	let pipeline = Pipeline::load_expecting(&config.artifact, &FEATURES)?;

	let builder = heart_data::read_evaluation(&config.dataset)?;
	let dataset = builder.build();

	let output_error = |source| TrainError::Output { path: config.output.clone(), source };
	let mut writer = BufWriter::new(File::create(&config.output).map_err(output_error)?);

	for row in dataset.rows() {
		let proba = pipeline.predict_proba(&row);
		let label = argmax(&proba);

		writeln!(writer, "{},{:.4}", label, proba[label]).map_err(output_error)?;
	}
	writer.flush().map_err(output_error)?;

	info!(rows = dataset.rows_len(), path = %config.output.display(), "wrote predictions");
	Ok(dataset.rows_len())
}
