use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use heart_risk::config::{EvaluateConfig, ServeConfig, TrainConfig};
use heart_risk::{server, training};

#[derive(Parser)]
#[command(name = "heart-risk")]
#[command(version)]
#[command(about = "Heart disease risk model: training and web front end", long_about = None)]
struct Cli {
	/// Log level (trace, debug, info, warn, error)
	#[arg(long, global = true, env = "HEART_RISK_LOG", default_value = "info")]
	log_level: Level,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Fit the pipeline on a labelled dataset and write the artifact
	Fit(TrainConfig),
	/// Score an unlabelled dataset with a fitted artifact
	Evaluate(EvaluateConfig),
	/// Serve the prediction form over HTTP
	Serve(ServeConfig),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let subscriber = FmtSubscriber::builder()
		.with_max_level(cli.log_level)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	match cli.command {
		Command::Fit(config) => {
			if let Err(e) = training::fit(&config) {
				error!("{}", e);
				return Err(e).context("training failed, no artifact written");
			}
			info!("pipeline written to {}", config.artifact.display());
		},
		Command::Evaluate(config) => {
			training::evaluate(&config).context("evaluation failed")?;
		},
		Command::Serve(config) => {
			let runtime = tokio::runtime::Runtime::new()?;
			runtime
				.block_on(server::serve(&config))
				.with_context(|| format!("server on {} stopped", config.bind))?;
		},
	}

	Ok(())
}
