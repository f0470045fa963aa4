//! Web front end: a form at `/` and form submissions at `/predict`.
//!
//! Every response is a rendered page with status 200; failures are shown to the
//! user as messages instead of HTTP errors.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info, warn};

use crate::config::ServeConfig;
use crate::features::{FeatureVector, FEATURES};
use crate::model::{assess, RiskModel};
use crate::page::{self, Outcome};
use crate::pipeline::Pipeline;

pub const MODEL_NOT_LOADED: &str = "Model is not loaded. Please check server logs.";
pub const INVALID_INPUT: &str = "Invalid input. Please ensure all fields are filled correctly with numerical values.";

#[derive(Clone, Default)]
pub struct AppState {
	model: Option<Arc<dyn RiskModel>>,
}

impl AppState {
	pub fn new(model: Option<Arc<dyn RiskModel>>) -> Self {
		Self { model }
	}

	/// Loads the artifact, falling back to a state without a model when that fails.
	pub fn load(artifact: &Path) -> Self {
		match Pipeline::load_expecting(artifact, &FEATURES) {
			Ok(pipeline) => {
				info!(path = %artifact.display(), "pipeline loaded");
				Self::new(Some(Arc::new(pipeline)))
			},
			Err(e) => {
				error!("{}; predictions are disabled", e);
				Self::new(None)
			},
		}
	}

	pub fn has_model(&self) -> bool {
		self.model.is_some()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(home))
		.route("/predict", post(predict))
		.with_state(state)
}

pub async fn serve(config: &ServeConfig) -> std::io::Result<()> {
	let state = AppState::load(&config.artifact);
	let app = router(state);

	let listener = tokio::net::TcpListener::bind(config.bind).await?;
	info!("listening on http://{}", listener.local_addr()?);

	axum::serve(listener, app).await
}

async fn home() -> Html<String> {
	Html(page::render(&Outcome::Empty, &HashMap::new()))
}

async fn predict(
	State(state): State<AppState>,
	form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Html<String> {
	let values = match form {
		Ok(Form(pairs)) => first_values(pairs),
		Err(e) => {
			warn!("unreadable form: {}", e);
			HashMap::new()
		},
	};

	let outcome = respond(state.model.as_deref(), &values);
	Html(page::render(&outcome, &values))
}

/// Collapses repeated keys to the value submitted first.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
	let mut values = HashMap::new();

	for (key, value) in pairs {
		values.entry(key).or_insert(value);
	}

	values
}

fn respond(model: Option<&dyn RiskModel>, values: &HashMap<String, String>) -> Outcome {
	let model = match model {
		Some(model) => model,
		None => return Outcome::Error(MODEL_NOT_LOADED.to_string()),
	};

	let features = match FeatureVector::from_form(values) {
		Ok(features) => features,
		Err(_) => return Outcome::Error(INVALID_INPUT.to_string()),
	};

	match assess(model, &features) {
		Ok(prediction) => Outcome::Prediction(prediction),
		Err(e) => {
			warn!("prediction failed: {}", e);
			Outcome::Error(format!("An error occurred during prediction: {}", e))
		},
	}
}
