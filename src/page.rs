use std::collections::HashMap;
use std::fmt::Write;

use crate::features::{FEATURES, LABELS};
use crate::model::Prediction;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	Empty,
	Prediction(Prediction),
	Error(String),
}

pub fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}

	escaped
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Heart Disease Risk</title>
<style>
body { font-family: sans-serif; max-width: 40em; margin: 2em auto; }
label { display: block; margin-top: .6em; }
input { width: 100%; }
.result { margin-top: 1.5em; padding: 1em; border-radius: 4px; }
.prediction-0 { background: #e3f4e1; }
.prediction-1 { background: #f8dcdc; }
.error { background: #fff1cc; }
</style>
</head>
<body>
<h1>Heart Disease Risk</h1>
<form action="/predict" method="post">
"#;

const TAIL: &str = r#"<button type="submit">Predict</button>
</form>
"#;

/// Renders the form, refilled with `values`, followed by the outcome if there is one.
pub fn render(outcome: &Outcome, values: &HashMap<String, String>) -> String {
	let mut page = String::from(HEAD);

	for (name, label) in FEATURES.iter().zip(LABELS.iter()) {
		let value = values.get(*name).map(|v| escape(v)).unwrap_or_default();
		let _ = writeln!(
			page,
			r#"<label for="{name}">{label}</label><input id="{name}" name="{name}" type="text" value="{value}">"#,
			name = name,
			label = label,
			value = value,
		);
	}

	page.push_str(TAIL);

	match outcome {
		Outcome::Empty => {},
		Outcome::Prediction(prediction) => {
			let _ = writeln!(
				page,
				r#"<div class="result prediction-{}">{}</div>"#,
				prediction.risk.class(),
				escape(&prediction.to_string())
			);
		},
		Outcome::Error(message) => {
			let _ = writeln!(page, r#"<div class="result error">{}</div>"#, escape(message));
		},
	}

	page.push_str("</body>\n</html>\n");
	page
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Risk;

	#[test]
	fn escapes_markup() {
		assert_eq!(escape(r#"<b a="x">&'"#), "&lt;b a=&quot;x&quot;&gt;&amp;&#39;");
	}

	#[test]
	fn empty_page_has_every_field() {
		let page = render(&Outcome::Empty, &HashMap::new());

		for name in FEATURES.iter() {
			assert!(page.contains(&format!(r#"name="{}""#, name)));
		}
		assert!(!page.contains("class=\"result"));
	}

	#[test]
	fn embeds_prediction_and_submitted_values() {
		let mut values = HashMap::new();
		values.insert("age".to_string(), "63\"><script>".to_string());
		let prediction = Prediction { risk: Risk::High, probability: 0.75 };

		let page = render(&Outcome::Prediction(prediction), &values);

		assert!(page.contains("prediction-1"));
		assert!(page.contains("The model predicts a high probability (75.00%) of heart disease."));
		assert!(page.contains(r#"value="63&quot;&gt;&lt;script&gt;""#));
	}

	#[test]
	fn embeds_escaped_error() {
		let page = render(&Outcome::Error("bad <input>".to_string()), &HashMap::new());

		assert!(page.contains(r#"<div class="result error">bad &lt;input&gt;</div>"#));
	}
}
