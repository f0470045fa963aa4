use std::io::{Read, Write};
use rand::Rng;
use rand::seq::SliceRandom as _;
use ordered_float::OrderedFloat;

use crate::dataset::Dataset;
use crate::node::{Node, Split};
use crate::classifier::Classifier;
use crate::functions::{self, gini, most_frequent, gini_val, Histogram};

// Sliding window of gini
// https://arxiv.org/pdf/1403.6348.pdf
struct SlidingGini {
	n: usize,
	ni: Histogram,
	g: f64
}

impl SlidingGini {
	pub fn new(targets: impl Iterator<Item = f64>) -> Self {
		let (histogram, len) = functions::histogram(targets);

		Self {
			n: len,
			g: gini_val(&histogram, len),
			ni: histogram,
		}
	}

	pub fn inc(&mut self, typ: OrderedFloat<f64>) {
		let entry = self.ni.entry(typ).or_insert(0);
		*entry += 1;
		self.n += 1;
		self.g = 1.0 - 1.0 / (self.n as f64).powi(2) * (((self.n - 1) as f64).powi(2) * (1.0 - self.g) + 2.0 * *entry as f64 - 1.0);
	}

	pub fn dec(&mut self, typ: OrderedFloat<f64>) {
		let entry = self.ni.entry(typ).or_insert(0);
		*entry -= 1;
		self.n -= 1;

		if self.n == 0 {
			self.g = 0.0;
			return;
		}

		self.g = 1.0 - 1.0 / (self.n as f64).powi(2) * (((self.n + 1) as f64).powi(2) * (1.0 - self.g) - 2.0 * *entry as f64 - 1.0);
	}

	pub fn gini(&self) -> f64 {
		self.g
	}
}

struct NodeBuilder<R> {
	max_features: usize,
	max_depth: usize,
	rng: R
}

impl<R: Rng> NodeBuilder<R> {
	fn leaf(dataset: &Dataset) -> Node {
		Node::Leaf(most_frequent(dataset.targets()).unwrap_or(0.0))
	}

	fn build(&mut self, dataset: &mut Dataset, depth: usize) -> Node {
		if depth > self.max_depth {
			return Self::leaf(dataset);
		}

		let impurity = gini(dataset.targets());
		if impurity < std::f64::EPSILON {
			return Self::leaf(dataset);
		}

		let mut best_split: Option<Split> = None;
		let mut best_gain = std::f64::MIN;
		let columns = (0..dataset.features_len()).collect::<Vec<usize>>();
		let max_features = std::cmp::min(columns.len(), self.max_features);

		for &column in columns.choose_multiple(&mut self.rng, max_features) {
			dataset.sort(column);

			let mut left_window: Option<SlidingGini> = None;
			let mut right_window: Option<SlidingGini> = None;

			let mut prev_end = 0;
			let mut targets = dataset.targets();

			for (left, value) in dataset.get_splits(column) {
				// Rows between the previous split and this one move from the right window to the left.
				// The windows are seeded on the first split, so the iterator only has to be advanced then.
				for target in targets.by_ref().take(left.end - prev_end) {
					if let (Some(l), Some(r)) = (&mut left_window, &mut right_window) {
						let cls = OrderedFloat(target);
						l.inc(cls);
						r.dec(cls);
					}
				}

				if left_window.is_none() {
					left_window = Some(SlidingGini::new(dataset.targets().take(left.end)));
					right_window = Some(SlidingGini::new(dataset.targets().skip(left.end)));
				}

				let impurity_l = left_window.as_ref().map_or(0.0, SlidingGini::gini);
				let impurity_r = right_window.as_ref().map_or(0.0, SlidingGini::gini);

				let ratio_l = (left.end - left.start) as f64 / dataset.rows_len() as f64;
				let ratio_r = 1.0 - ratio_l;

				let gain = impurity - (ratio_l * impurity_l + ratio_r * impurity_r);

				if best_gain < gain {
					best_split = Some(Split { column, value });
					best_gain = gain;
				}

				prev_end = left.end;
			}
		}

		if let Some(split) = best_split {
			self.build_children(dataset, split, depth)
		} else {
			Self::leaf(dataset)
		}
	}

	pub fn build_children(&mut self, dataset: &mut Dataset, split: Split, depth: usize) -> Node {
		dataset.sort(split.column);

		let split_row = dataset
			.column(split.column)
			.take_while(|&f| f <= split.value)
			.count();

		let (left, right) = dataset.split(split_row, |x| Box::new(self.build(x, depth + 1)));

		Node::Children {
			left, right, split
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
	root: Node,
}

impl DecisionTree {
	pub fn from_root(root: Node) -> Self {
		Self { root }
	}
}

impl Classifier for DecisionTree {
	fn predict(&self, x: &[f64]) -> f64 {
		self.root.predict(x)
	}

	fn features_used(&self) -> usize {
		self.root.max_column().map_or(0, |column| column + 1)
	}

	fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		self.root.serialize(writer)
	}

	fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let root = Node::deserialize(reader)?;

		Ok(Self {
			root
		})
	}
}

pub struct DecisionTreeBuilder {
	pub max_features: Option<usize>,
	pub max_depth: usize,
}

impl Default for DecisionTreeBuilder {
	fn default() -> Self {
		Self {
			max_features: None,
			max_depth: 32,
		}
	}
}

impl DecisionTreeBuilder {
	pub fn fit<R: Rng + ?Sized>(&self, rng: &mut R, mut dataset: Dataset) -> DecisionTree {
		let max_features = self.max_features.unwrap_or(dataset.features_len());
		let root = (NodeBuilder {
			max_features,
			max_depth: self.max_depth,
			rng
		}).build(&mut dataset, 1);

		DecisionTree { root }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dataset::Builder;
	use rand::{rngs::StdRng, SeedableRng};

	fn separable() -> Builder {
		let mut builder = Builder::new();
		for i in 0..40 {
			let x = i as f64;
			// Second column is noise, the first one decides the class.
			builder.add(&[x, ((i * 7) % 11) as f64], if x >= 20.0 { 1.0 } else { 0.0 });
		}
		builder
	}

	#[test]
	fn sliding_gini_matches_full_recount() {
		let mut window = SlidingGini::new(vec![0.0, 1.0, 1.0].into_iter());
		window.inc(OrderedFloat(0.0));
		assert!((window.gini() - gini(vec![0.0, 1.0, 1.0, 0.0].into_iter())).abs() < 1e-12);

		window.dec(OrderedFloat(1.0));
		assert!((window.gini() - gini(vec![0.0, 1.0, 0.0].into_iter())).abs() < 1e-12);
	}

	#[test]
	fn learns_separable_data() {
		let builder = separable();
		let dataset = builder.build();
		let mut rng = StdRng::seed_from_u64(1);

		let tree = DecisionTreeBuilder::default().fit(&mut rng, dataset.clone());

		assert_eq!(dataset.evaluate(&tree), 1.0);
		assert_eq!(tree.predict(&[3.0, 5.0]), 0.0);
		assert_eq!(tree.predict(&[33.0, 5.0]), 1.0);
	}

	#[test]
	fn pure_data_gives_single_leaf() {
		let mut builder = Builder::new();
		builder.add(&[1.0], 1.0);
		builder.add(&[2.0], 1.0);
		let mut rng = StdRng::seed_from_u64(1);

		let tree = DecisionTreeBuilder::default().fit(&mut rng, builder.build());

		assert_eq!(tree, DecisionTree::from_root(Node::Leaf(1.0)));
		assert_eq!(tree.features_used(), 0);
	}

	#[test]
	fn depth_limit_stops_growth() {
		let builder = separable();
		let mut rng = StdRng::seed_from_u64(1);

		let tree = (DecisionTreeBuilder { max_features: None, max_depth: 0 }).fit(&mut rng, builder.build());

		assert!(matches!(tree.root, Node::Leaf(_)));
	}
}
