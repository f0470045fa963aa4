use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::classifier::{invalid_data, Classifier};
use crate::decision_tree::{DecisionTreeBuilder, DecisionTree};
use crate::functions::argmax;

/// Labels are class indices: 0 for low risk, 1 for high risk.
pub const CLASSES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestBuilder {
    pub n_trees: usize,
    pub max_depth: usize,
    pub bag_amount: f64,
    pub seed: u64,
}

impl Default for RandomForestBuilder {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 32,
            bag_amount: 1.0,
            seed: 42,
        }
    }
}

impl RandomForestBuilder {
    pub fn fit(&self, dataset: Dataset) -> RandomForestClassifier {
        let feature_len = (dataset.features_len() as f64).sqrt().ceil() as usize;
        let done = AtomicUsize::new(0);
        let whole = Instant::now();

        // Each tree owns an rng derived from the seed, so the result does not depend on scheduling.
        let forest = self.get_rngs()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|mut rng| {
                let now = Instant::now();
                let tree = self.fit_tree(&mut rng, &dataset, feature_len);

                let i = done.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    "[{:.1}%] tree fitted in {:.1} ms",
                    i as f64 / self.n_trees as f64 * 100.0,
                    now.elapsed().as_secs_f64() * 1000.0,
                );

                tree
            })
            .collect::<Vec<_>>();

        info!(
            trees = forest.len(),
            rows = dataset.rows_len(),
            "forest fitted in {:.2} s",
            whole.elapsed().as_secs_f64()
        );

        RandomForestClassifier {
            forest
        }
    }

    fn fit_tree<R: Rng + ?Sized>(&self, rng: &mut R, dataset: &Dataset, feature_len: usize) -> DecisionTree {
        let builder = DecisionTreeBuilder {
            max_features: Some(feature_len),
            max_depth: self.max_depth,
        };

        let max_samples = (dataset.rows_len() as f64 * self.bag_amount).round() as usize;
        let bootstrapped = dataset.bootstrap(rng, max_samples);

        builder.fit(rng, bootstrapped)
    }

    fn get_rngs(&self) -> impl Iterator<Item = StdRng> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.n_trees).map(move |_| {
            let mut seed = [0u8; 32];
            rng.fill(&mut seed);
            StdRng::from_seed(seed)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestClassifier {
    forest: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn from_trees(forest: Vec<DecisionTree>) -> Self {
        Self { forest }
    }

    pub fn trees_len(&self) -> usize {
        self.forest.len()
    }

    /// Share of trees voting for each class.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut votes = vec![0usize; CLASSES];

        for label in self.forest.iter().map(|tree| tree.predict(x)) {
            if label < 0.0 || label.fract() != 0.0 {
                continue;
            }

            if let Some(count) = votes.get_mut(label as usize) {
                *count += 1;
            }
        }

        votes
            .into_iter()
            .map(|n| n as f64 / self.forest.len() as f64)
            .collect()
    }
}

impl Classifier for RandomForestClassifier {
    fn predict(&self, x: &[f64]) -> f64 {
        argmax(&self.predict_proba(x)) as f64
    }

    fn features_used(&self) -> usize {
        self.forest.iter().map(Classifier::features_used).max().unwrap_or(0)
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.forest.len() > u16::MAX as usize {
            return Err(invalid_data(format!("{} trees do not fit the artifact format", self.forest.len())));
        }

        writer.write_u16::<BigEndian>(self.forest.len() as u16)?;

        for tree in &self.forest {
            tree.serialize(writer)?;
        }

        Ok(())
    }

    fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let len = reader.read_u16::<BigEndian>()?;
        if len == 0 {
            return Err(invalid_data("forest without trees"));
        }

        let forest = (0..len)
            .map(|_| DecisionTree::deserialize(reader))
            .collect::<std::io::Result<Vec<DecisionTree>>>()?;

        Ok(Self {
            forest
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, Split};

    fn stump(value: f64) -> DecisionTree {
        DecisionTree::from_root(Node::Children {
            split: Split { column: 0, value },
            left: Box::new(Node::Leaf(0.0)),
            right: Box::new(Node::Leaf(1.0)),
        })
    }

    #[test]
    fn probabilities_are_vote_shares() {
        let forest = RandomForestClassifier::from_trees(vec![stump(1.0), stump(2.0), stump(3.0), stump(4.0)]);

        assert_eq!(forest.predict_proba(&[3.5]), vec![0.25, 0.75]);
        assert_eq!(forest.predict(&[3.5]), 1.0);
        assert_eq!(forest.predict_proba(&[0.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn tie_goes_to_low_risk() {
        let forest = RandomForestClassifier::from_trees(vec![stump(1.0), stump(2.0)]);

        assert_eq!(forest.predict_proba(&[1.5]), vec![0.5, 0.5]);
        assert_eq!(forest.predict(&[1.5]), 0.0);
    }

    #[test]
    fn serialization_works() -> std::io::Result<()> {
        let forest = RandomForestClassifier::from_trees(vec![stump(1.0), stump(2.0)]);

        let mut bytes = Vec::new();
        forest.serialize(&mut bytes)?;

        assert_eq!(RandomForestClassifier::deserialize(&mut bytes.as_slice())?, forest);
        Ok(())
    }

    #[test]
    fn rejects_empty_forest() {
        let bytes = [0u8, 0];

        assert!(RandomForestClassifier::deserialize(&mut &bytes[..]).is_err());
    }

    #[test]
    fn same_seed_gives_same_forest() {
        let mut builder = crate::dataset::Builder::new();
        for i in 0..60 {
            builder.add(&[i as f64, ((i * 13) % 17) as f64, ((i * 5) % 3) as f64], if i % 3 == 0 { 1.0 } else { 0.0 });
        }
        let forest = RandomForestBuilder { n_trees: 8, ..Default::default() };

        assert_eq!(forest.fit(builder.build()), forest.fit(builder.build()));
    }
}
