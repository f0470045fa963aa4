use std::collections::BTreeMap;
use ordered_float::OrderedFloat;

// Ordered so that iteration, and therefore tie breaking, is stable between runs.
pub type Histogram = BTreeMap<OrderedFloat<f64>, usize>;

pub fn histogram(values: impl Iterator<Item = f64>) -> (Histogram, usize) {
	let mut histogram = BTreeMap::new();
	let mut len = 0;

	for value in values {
		*histogram.entry(OrderedFloat(value)).or_default() += 1;
		len += 1;
	}

	(histogram, len)
}

pub fn gini_val(histogram: &Histogram, len: usize) -> f64 {
	if len == 0 {
		return 0.0;
	}

	1.0 - histogram
		.values()
		.map(|&n| (n as f64 / len as f64).powi(2))
		.sum::<f64>()
}

pub fn gini(values: impl Iterator<Item = f64>) -> f64 {
	let (histogram, len) = histogram(values);
	gini_val(&histogram, len)
}

/// Most common value, the smallest one winning ties.
pub fn most_frequent(values: impl Iterator<Item = f64>) -> Option<f64> {
	let (histogram, _) = histogram(values);

	histogram
		.into_iter()
		.fold(None, |best: Option<(OrderedFloat<f64>, usize)>, (value, n)| match best {
			Some((_, m)) if m >= n => best,
			_ => Some((value, n)),
		})
		.map(|(value, _)| value.into_inner())
}

/// Index of the largest share, the lowest index winning ties.
pub fn argmax(shares: &[f64]) -> usize {
	shares
		.iter()
		.enumerate()
		.fold((0, std::f64::MIN), |best, (i, &share)| if share > best.1 { (i, share) } else { best })
		.0
}
