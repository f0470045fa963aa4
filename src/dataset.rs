use crate::classifier::Classifier;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::ops::Range;
use rand::seq::SliceRandom;
use rand::Rng;
use ordered_float::OrderedFloat;

#[derive(Clone, Debug)]
pub struct Dataset<'a> {
	columns: &'a [Vec<f64>],
	targets: &'a [f64],

	index: Vec<usize>,
	range: Range<usize>,
}

impl<'a, 'b> Dataset<'a> {
	/// Share of rows the classifier labels correctly.
	pub fn evaluate<C: Classifier + Sync>(&self, classifier: &C) -> f64 {
		if self.rows_len() == 0 {
			return 0.0;
		}

		self.rows()
			.zip(self.targets())
			.collect::<Vec<_>>()
			.into_par_iter()
			.filter(|(x, y)| classifier.predict(x) == *y)
			.count() as f64 / self.rows_len() as f64
	}

	pub fn sort(&mut self, column: usize) {
		let column = &self.columns[column];

		self.index[self.range.start..self.range.end]
			.sort_by_key(|&x| OrderedFloat(column[x]));
	}

	/// Candidate thresholds of a sorted column: the midpoint between every pair of
	/// neighbouring distinct values, together with the rows falling on the left.
	pub fn get_splits(&'b self, column: usize) -> impl 'b + Iterator<Item = (Range<usize>, f64)> {
		let column = &self.columns[column];

		self.indices()
			.map(|x| column[x])
			.enumerate()
			.scan(None, |prev: &mut Option<f64>, (i, x)| {
				let split = match *prev {
					None => {
						*prev = Some(x);
						None
					},
					Some(y) if (y - x).abs() > std::f64::EPSILON => {
						*prev = Some(x);
						Some((0..i, (x + y) / 2.0))
					},
					Some(_) => None,
				};

				Some(split)
			})
			.flatten()
	}

	pub fn split<F, T>(&mut self, row: usize, mut f: F) -> (T, T)
	where
		F: FnMut(&mut Self) -> T,
	{
		let row = row + self.range.start;
		let original = self.range.clone();

		self.range.end = row;
		let left = f(self);
		self.range.end = original.end;

		self.range.start = row;
		let right = f(self);
		self.range.start = original.start;

		(left, right)
	}

	pub fn train_test_split<R: Rng + ?Sized>(mut self, rng: &mut R, test_rate: f64) -> (Self, Self) {
		self.index[self.range.start..self.range.end].shuffle(rng);
		let test_num = (self.rows_len() as f64 * test_rate).round() as usize;

		let mut train = self.clone();
		let mut test = self;
		test.range.end = test.range.start + test_num;
		train.range.start = test.range.end;

		(train, test)
	}

	/// Draws `max_samples` rows with replacement.
	pub fn bootstrap<R: Rng + ?Sized>(&self, rng: &mut R, max_samples: usize) -> Self {
		let samples = if self.rows_len() == 0 { 0 } else { max_samples };

		let range = 0..samples;
		let index = range
			.clone()
			.map(|_| self.index[rng.gen_range(self.range.start, self.range.end)])
			.collect::<Vec<_>>();

		Self {
			index,
			range,
			columns: self.columns,
			targets: self.targets,
		}
	}

	fn indices(&'b self) -> impl 'b + Iterator<Item = usize> + Clone {
		self.index[self.range.start..self.range.end]
			.iter()
			.copied()
	}

	pub fn targets(&'b self) -> impl 'b + Iterator<Item = f64> {
		self.indices()
			.map(|i| self.targets[i])
	}

	pub fn column(&'b self, column: usize) -> impl 'b + Iterator<Item = f64> {
		let column = &self.columns[column];

		self.indices()
			.map(|i| column[i])
	}

	pub fn features_len(&self) -> usize {
		self.columns.len()
	}

	pub fn rows_len(&self) -> usize {
		self.range.end - self.range.start
	}

	pub fn rows(&'b self) -> impl 'b + Iterator<Item = Vec<f64>> {
		self.indices().map(move |i| {
			(0..self.columns.len())
				.map(|j| self.columns[j][i])
				.collect()
		})
	}
}

#[derive(Debug, Default)]
pub struct Builder {
	columns: Vec<Vec<f64>>,
	targets: Vec<f64>,
}

impl Builder {
	pub fn new() -> Self {
		Self {
			columns: Vec::new(),
			targets: Vec::new(),
		}
	}

	pub fn build(&self) -> Dataset {
		let range = 0..self.targets.len();

		Dataset {
			columns: &self.columns,
			targets: &self.targets,

			range: range.clone(),
			index: range.collect(),
		}
	}

	pub fn add(&mut self, x: &[f64], y: f64) {
		if self.columns.is_empty() {
			self.columns = vec![Vec::new(); x.len()];
		}

		for (column, value) in self.columns.iter_mut().zip(x) {
			column.push(*value);
		}

		self.targets.push(y);
	}

	/// Adds an unlabelled row, as read from an evaluation set.
	pub fn add_x(&mut self, x: &[f64]) {
		self.add(x, 0.0);
	}

	pub fn rows_len(&self) -> usize {
		self.targets.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::{rngs::StdRng, SeedableRng};

	fn builder() -> Builder {
		let mut builder = Builder::new();
		builder.add(&[3.0, 10.0], 1.0);
		builder.add(&[1.0, 20.0], 0.0);
		builder.add(&[2.0, 20.0], 0.0);
		builder.add(&[2.0, 40.0], 1.0);
		builder
	}

	#[test]
	fn splits_between_distinct_sorted_values() {
		let builder = builder();
		let mut dataset = builder.build();
		dataset.sort(0);

		assert_eq!(dataset.column(0).collect::<Vec<_>>(), vec![1.0, 2.0, 2.0, 3.0]);
		assert_eq!(dataset.get_splits(0).collect::<Vec<_>>(), vec![(0..1, 1.5), (0..3, 2.5)]);
	}

	#[test]
	fn split_restores_range() {
		let builder = builder();
		let mut dataset = builder.build();

		let (left, right) = dataset.split(1, |d| d.rows_len());

		assert_eq!((left, right), (1, 3));
		assert_eq!(dataset.rows_len(), 4);
	}

	#[test]
	fn train_test_split_partitions_rows() {
		let builder = builder();
		let mut rng = StdRng::seed_from_u64(7);

		let (train, test) = builder.build().train_test_split(&mut rng, 0.25);

		assert_eq!(train.rows_len(), 3);
		assert_eq!(test.rows_len(), 1);
	}

	#[test]
	fn bootstrap_draws_requested_rows() {
		let builder = builder();
		let mut rng = StdRng::seed_from_u64(7);

		let sample = builder.build().bootstrap(&mut rng, 6);

		assert_eq!(sample.rows_len(), 6);
		assert!(sample.targets().all(|y| y == 0.0 || y == 1.0));
	}
}
