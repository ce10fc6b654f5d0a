//! CART decision tree with Gini impurity, grown on a bootstrap sample.

use rand::seq::index::sample as sample_indices;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A node in the flat tree arena. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Samples with `features[feature] <= threshold` go to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class distribution of the training samples that reached this leaf.
    Leaf { distribution: Vec<f64> },
}

impl Node {
    fn leaf(counts: &[usize], total: usize) -> Self {
        let total = total.max(1) as f64;
        Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features drawn per split.
    pub max_features: usize,
}

/// Training data borrowed for the duration of one tree fit.
pub(crate) struct FitContext<'a> {
    pub x: &'a [Vec<f64>],
    pub y: &'a [usize],
    pub n_classes: usize,
    pub n_features: usize,
    pub params: TreeParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
}

impl DecisionTree {
    /// Grows a tree over `samples` (row indices, duplicates allowed).
    pub(crate) fn fit(ctx: &FitContext<'_>, samples: &mut [usize], rng: &mut ChaCha8Rng) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        tree.grow(ctx, samples, 0, rng);
        tree
    }

    fn grow(
        &mut self,
        ctx: &FitContext<'_>,
        samples: &mut [usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let counts = class_counts(ctx.y, samples, ctx.n_classes);
        let index = self.nodes.len();
        self.nodes.push(Node::leaf(&counts, samples.len()));

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = ctx.params.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || samples.len() < ctx.params.min_samples_split {
            return index;
        }

        let Some(split) = best_split(ctx, samples, &counts, rng) else {
            return index;
        };

        let mut mid = 0;
        for i in 0..samples.len() {
            if ctx.x[samples[i]][split.feature] <= split.threshold {
                samples.swap(i, mid);
                mid += 1;
            }
        }

        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(ctx, left_samples, depth + 1, rng);
        let right = self.grow(ctx, right_samples, depth + 1, rng);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Leaf distribution reached by `features`.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    /// Checks the arena invariants `predict_proba` relies on: a root exists,
    /// children point forward within the arena, split features are inside the
    /// input width, and every leaf has one entry per class.
    pub fn validate(&self, n_classes: usize, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {index} splits on feature {feature} of {n_features}"
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {index} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {index} has {} scores for {n_classes} classes",
                            distribution.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                Node::Leaf { .. } => 0,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &s in samples {
        counts[y[s]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Lowest weighted child impurity over a random feature subset, or `None`
/// when no split improves on the parent.
fn best_split(
    ctx: &FitContext<'_>,
    samples: &[usize],
    parent_counts: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<Split> {
    let n = samples.len();
    let mut best_impurity = gini(parent_counts, n) - 1e-12;
    let mut best = None;

    // Features are visited in random order until `max_features` non-constant
    // ones have been evaluated; constant features do not count.
    let amount = ctx.params.max_features.clamp(1, ctx.n_features);
    let visiting_order = sample_indices(rng, ctx.n_features, ctx.n_features);
    let mut evaluated = 0;

    let mut order = samples.to_vec();
    for feature in visiting_order.iter() {
        if evaluated >= amount {
            break;
        }
        order.sort_by(|&a, &b| ctx.x[a][feature].total_cmp(&ctx.x[b][feature]));
        if ctx.x[order[0]][feature] >= ctx.x[order[n - 1]][feature] {
            continue;
        }
        evaluated += 1;

        let mut left = vec![0usize; ctx.n_classes];
        let mut right = parent_counts.to_vec();
        for i in 0..n - 1 {
            let class = ctx.y[order[i]];
            left[class] += 1;
            right[class] -= 1;

            let value = ctx.x[order[i]][feature];
            let next = ctx.x[order[i + 1]][feature];
            if value >= next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;
            if impurity < best_impurity {
                best_impurity = impurity;
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Split { feature, threshold });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn test_gini_pure_and_balanced() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tree_separates_linearly_separable_data() {
        let x = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![8.0, 0.0], vec![9.0, 0.0]];
        let y = vec![0, 0, 1, 1];
        let ctx = FitContext {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 2,
            params: params(),
        };
        let mut samples: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = DecisionTree::fit(&ctx, &mut samples, &mut rng);

        assert_eq!(tree.predict_proba(&[1.5, 0.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[8.5, 0.0]), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_max_depth_zero_gives_single_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0, 1, 1];
        let ctx = FitContext {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 1,
            params: TreeParams {
                max_depth: Some(0),
                ..params()
            },
        };
        let mut samples: Vec<usize> = (0..3).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&ctx, &mut samples, &mut rng);

        assert_eq!(tree.nodes().len(), 1);
        let dist = tree.predict_proba(&[10.0]);
        assert!((dist[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((dist[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_features_cannot_split() {
        let x = vec![vec![5.0], vec![5.0]];
        let y = vec![0, 1];
        let ctx = FitContext {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 1,
            params: params(),
        };
        let mut samples = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let tree = DecisionTree::fit(&ctx, &mut samples, &mut rng);
        assert_eq!(tree.predict_proba(&[5.0]), &[0.5, 0.5]);
    }
}
