//! Random forest classifier: bagged Gini trees whose leaf distributions are
//! averaged into class probabilities.
//!
//! Tree `t` draws its bootstrap sample and feature subsets from a ChaCha8 RNG
//! seeded with `seed + t`, so a fit is a pure function of data and params.

mod tree;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use tree::{DecisionTree, Node, TreeParams};

use crate::classifier::Classifier;
use crate::error::{ModelError, Result};
use tree::FitContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits `params.n_estimators` trees on rows `x` with class labels `y`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(ModelError::Training("no training rows".into()));
        }
        if x.len() != y.len() {
            return Err(ModelError::Training(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(ModelError::Training("n_estimators must be at least 1".into()));
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(ModelError::Training("feature rows are empty".into()));
        }
        if let Some(row) = x.iter().position(|row| row.len() != n_features) {
            return Err(ModelError::Training(format!(
                "row {row} has width {}, expected {n_features}",
                x[row].len()
            )));
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(ModelError::Training(format!(
                "label {label} out of range for {n_classes} classes"
            )));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };
        let ctx = FitContext {
            x,
            y,
            n_classes,
            n_features,
            params: tree_params,
        };

        let n = x.len();
        let trees = (0..params.n_estimators)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let mut samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let tree = DecisionTree::fit(&ctx, &mut samples, &mut rng);
                debug!(tree = t, nodes = tree.nodes().len(), "fitted tree");
                tree
            })
            .collect();

        info!(
            n_estimators = params.n_estimators,
            rows = n,
            n_features,
            n_classes,
            "random forest fitted"
        );

        Ok(Self {
            n_classes,
            n_features,
            trees,
        })
    }

    /// Structural check for a deserialized forest, so a malformed artifact
    /// fails at load rather than on the first prediction.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ModelError::ArtifactMismatch("forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes, self.n_features)
                .map_err(|reason| ModelError::ArtifactMismatch(format!("tree {t}: {reason}")))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        proba
    }
}
