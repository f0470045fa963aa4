use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use tracing::{debug, info};

use crate::dataset;
use crate::error::DatasetError;
use crate::features::{FEATURES, TARGET};

struct Columns {
	features: Vec<usize>,
	target: Option<usize>,
	width: usize,
}

fn fields(line: &str) -> Vec<&str> {
	line.split(',')
		.map(|x| x.trim().trim_matches('"'))
		.collect()
}

fn locate(header: &str, with_target: bool) -> Result<Columns, DatasetError> {
	let names = fields(header.trim_start_matches('\u{feff}'));
	let position = |name: &str| {
		names
			.iter()
			.position(|&x| x == name)
			.ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
	};

	let features = FEATURES
		.iter()
		.map(|name| position(*name))
		.collect::<Result<Vec<_>, _>>()?;
	let target = if with_target { Some(position(TARGET)?) } else { None };

	let width = features.iter().chain(target.iter()).max().map_or(0, |&i| i + 1);

	Ok(Columns { features, target, width })
}

fn number(row: &[&str], column: usize, line: usize, name: &str) -> Result<f64, DatasetError> {
	row[column].parse::<f64>().map_err(|_| DatasetError::InvalidValue {
		line,
		column: name.to_string(),
		value: row[column].to_string(),
	})
}

fn load(dataset_location: &Path, with_target: bool) -> Result<dataset::Builder, DatasetError> {
	let file = fs::File::open(dataset_location).map_err(|source| match source.kind() {
		io::ErrorKind::NotFound => DatasetError::NotFound(dataset_location.to_path_buf()),
		_ => DatasetError::Io { path: dataset_location.to_path_buf(), source },
	})?;
	let io_error = |source| DatasetError::Io { path: dataset_location.to_path_buf(), source };

	let mut lines = io::BufReader::new(file).lines();
	let header = match lines.next() {
		Some(line) => line.map_err(io_error)?,
		None => return Err(DatasetError::Empty(dataset_location.to_path_buf())),
	};
	let columns = locate(&header, with_target)?;

	let mut builder = dataset::Builder::new();
	let mut x = vec![0.0; FEATURES.len()];

	for (i, line) in lines.enumerate() {
		let line_number = i + 2;
		let line = line.map_err(io_error)?;
		if line.trim().is_empty() {
			continue;
		}

		let row = fields(&line);
		if row.len() < columns.width {
			return Err(DatasetError::ShortRow { line: line_number, expected: columns.width, found: row.len() });
		}

		for ((value, &column), name) in x.iter_mut().zip(&columns.features).zip(FEATURES.iter()) {
			*value = number(&row, column, line_number, name)?;
		}

		match columns.target {
			Some(column) => {
				let y = number(&row, column, line_number, TARGET)?;
				if y != 0.0 && y != 1.0 {
					return Err(DatasetError::InvalidTarget { line: line_number, value: y });
				}
				builder.add(&x, y);
			},
			None => builder.add_x(&x),
		}

		if builder.rows_len() % 1000 == 0 {
			debug!(rows = builder.rows_len(), "reading dataset");
		}
	}

	if builder.rows_len() == 0 {
		return Err(DatasetError::Empty(dataset_location.to_path_buf()));
	}

	info!(path = %dataset_location.display(), rows = builder.rows_len(), "dataset loaded");

	Ok(builder)
}

/// Reads the feature columns and the binary target from a headered CSV file.
pub fn read(dataset_location: &Path) -> Result<dataset::Builder, DatasetError> {
	load(dataset_location, true)
}

/// Reads only the feature columns, for scoring unlabelled rows.
pub fn read_evaluation(dataset_location: &Path) -> Result<dataset::Builder, DatasetError> {
	load(dataset_location, false)
}
