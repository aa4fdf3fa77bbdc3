//! Random forest of CART trees for feature-importance estimation.
//!
//! Classification trees split on Gini impurity and consider `sqrt(n_features)` candidate
//! features per node; regression trees split on mean squared error over all features.
//! Every tree is grown on a bootstrap sample. Importances are the mean decrease in
//! impurity, normalized per tree, averaged across trees and normalized to sum to 1.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

/// Learning task of a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestTask {
    /// Labels are class codes `0..n_classes`.
    Classification { n_classes: usize },
    Regression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    decrease: f64,
}

/// Grows one tree and accumulates its raw impurity decreases.
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    task: ForestTask,
    params: &'a ForestParams,
    max_features: usize,
    total_samples: f64,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn impurity(&self, samples: &[usize]) -> f64 {
        match self.task {
            ForestTask::Classification { n_classes } => {
                let mut counts = vec![0.0; n_classes];
                for &i in samples {
                    counts[self.y[i] as usize] += 1.0;
                }
                gini(&counts, samples.len() as f64)
            }
            ForestTask::Regression => {
                let (sum, sum_sq) = samples
                    .iter()
                    .fold((0.0, 0.0), |(s, q), &i| (s + self.y[i], q + self.y[i] * self.y[i]));
                mse(sum, sum_sq, samples.len() as f64)
            }
        }
    }

    fn leaf_value(&self, samples: &[usize]) -> f64 {
        match self.task {
            ForestTask::Classification { n_classes } => {
                let mut counts = vec![0usize; n_classes];
                for &i in samples {
                    counts[self.y[i] as usize] += 1;
                }
                // first class wins ties
                let mut best = 0;
                for (class, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = class;
                    }
                }
                best as f64
            }
            ForestTask::Regression => {
                samples.iter().map(|&i| self.y[i]).sum::<f64>() / samples.len().max(1) as f64
            }
        }
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.leaf_value(&samples),
        });

        let impurity = self.impurity(&samples);
        if depth >= self.params.max_depth
            || samples.len() < self.params.min_samples_split
            || impurity <= 1e-12
        {
            return idx;
        }

        let Some(split) = self.best_split(&samples, impurity, rng) else {
            return idx;
        };

        self.importances[split.feature] += split.decrease;
        let left = self.build(split.left, depth + 1, rng);
        let right = self.build(split.right, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&self, samples: &[usize], impurity: f64, rng: &mut StdRng) -> Option<BestSplit> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let candidates = sample(rng, n_features, self.max_features.min(n_features)).into_vec();
        let n = samples.len() as f64;

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in candidates {
            let mut order: Vec<usize> = samples.to_vec();
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let Some((threshold, child_impurity)) = self.sweep(&order, feature) else {
                continue;
            };
            let decrease = (n / self.total_samples) * (impurity - child_impurity);
            if decrease > 1e-12 && best.map_or(true, |(_, _, d)| decrease > d) {
                best = Some((feature, threshold, decrease));
            }
        }

        let (feature, threshold, decrease) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x[i][feature] <= threshold);
        if left.is_empty() || right.is_empty() {
            return None;
        }
        Some(BestSplit {
            feature,
            threshold,
            left,
            right,
            decrease,
        })
    }

    /// Scans sorted samples for the threshold with the lowest weighted child impurity.
    fn sweep(&self, order: &[usize], feature: usize) -> Option<(f64, f64)> {
        let n = order.len();
        let mut best: Option<(f64, f64)> = None;

        match self.task {
            ForestTask::Classification { n_classes } => {
                let mut left = vec![0.0; n_classes];
                let mut right = vec![0.0; n_classes];
                for &i in order {
                    right[self.y[i] as usize] += 1.0;
                }
                for pos in 0..n.saturating_sub(1) {
                    let class = self.y[order[pos]] as usize;
                    left[class] += 1.0;
                    right[class] -= 1.0;
                    let (here, next) = (self.x[order[pos]][feature], self.x[order[pos + 1]][feature]);
                    if here >= next {
                        continue;
                    }
                    let (nl, nr) = ((pos + 1) as f64, (n - pos - 1) as f64);
                    let weighted = (nl * gini(&left, nl) + nr * gini(&right, nr)) / n as f64;
                    if best.map_or(true, |(_, b)| weighted < b) {
                        best = Some(((here + next) / 2.0, weighted));
                    }
                }
            }
            ForestTask::Regression => {
                let (mut rs, mut rq) = order
                    .iter()
                    .fold((0.0, 0.0), |(s, q), &i| (s + self.y[i], q + self.y[i] * self.y[i]));
                let (mut ls, mut lq) = (0.0, 0.0);
                for pos in 0..n.saturating_sub(1) {
                    let v = self.y[order[pos]];
                    ls += v;
                    lq += v * v;
                    rs -= v;
                    rq -= v * v;
                    let (here, next) = (self.x[order[pos]][feature], self.x[order[pos + 1]][feature]);
                    if here >= next {
                        continue;
                    }
                    let (nl, nr) = ((pos + 1) as f64, (n - pos - 1) as f64);
                    let weighted = (nl * mse(ls, lq, nl) + nr * mse(rs, rq, nr)) / n as f64;
                    if best.map_or(true, |(_, b)| weighted < b) {
                        best = Some(((here + next) / 2.0, weighted));
                    }
                }
            }
        }
        best
    }
}

fn gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
}

fn mse(sum: f64, sum_sq: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    (sum_sq / n - (sum / n).powi(2)).max(0.0)
}

/// Fitted forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
    task: ForestTask,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fits a forest on row-major `x` and targets `y`.
    ///
    /// Returns `None` when there are no rows, no features, mismatched lengths, non-finite
    /// inputs, or class codes outside `0..n_classes`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], task: ForestTask, params: &ForestParams) -> Option<Self> {
        let n_features = x.first().map_or(0, Vec::len);
        if x.is_empty() || n_features == 0 || x.len() != y.len() || params.n_trees == 0 {
            return None;
        }
        if x.iter().any(|r| r.len() != n_features || r.iter().any(|v| !v.is_finite())) {
            return None;
        }
        if let ForestTask::Classification { n_classes } = task {
            if y.iter().any(|&c| c < 0.0 || c.fract() != 0.0 || c as usize >= n_classes) {
                return None;
            }
        } else if y.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let max_features = match task {
            ForestTask::Classification { .. } => ((n_features as f64).sqrt() as usize).max(1),
            ForestTask::Regression => n_features,
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = vec![0.0; n_features];

        for _ in 0..params.n_trees {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut builder = TreeBuilder {
                x,
                y,
                task,
                params,
                max_features,
                total_samples: n as f64,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.build(bootstrap, 0, &mut rng);

            let tree_total: f64 = builder.importances.iter().sum();
            if tree_total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(&builder.importances) {
                    *acc += imp / tree_total;
                }
            }
            trees.push(Tree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Some(Self {
            trees,
            task,
            importances,
        })
    }

    /// Normalized impurity-based importances, one per input column. Sums to 1 unless no
    /// tree found a useful split, in which case all are 0.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Majority vote (classification) or mean prediction (regression).
    pub fn predict(&self, row: &[f64]) -> f64 {
        match self.task {
            ForestTask::Classification { n_classes } => {
                let mut votes = vec![0usize; n_classes];
                for tree in &self.trees {
                    votes[tree.predict(row) as usize] += 1;
                }
                let mut best = 0;
                for (class, &count) in votes.iter().enumerate() {
                    if count > votes[best] {
                        best = class;
                    }
                }
                best as f64
            }
            ForestTask::Regression => {
                self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
            }
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 25,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }

    #[test]
    fn test_classifier_prefers_informative_feature() {
        // feature 0 decides the class, feature 1 is noise
        let x: Vec<Vec<f64>> = (0..60i32)
            .map(|i| vec![f64::from(i % 2), f64::from((i * 7) % 5)])
            .collect();
        let y: Vec<f64> = (0..60i32).map(|i| f64::from(i % 2)).collect();
        let forest =
            RandomForest::fit(&x, &y, ForestTask::Classification { n_classes: 2 }, &params())
                .unwrap();
        let imp = forest.feature_importances();
        assert!(imp[0] > imp[1]);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(forest.predict(&[1.0, 3.0]), 1.0);
    }

    #[test]
    fn test_regressor_tracks_signal() {
        let x: Vec<Vec<f64>> = (0..50i32).map(|i| vec![f64::from(i), 1.0]).collect();
        let y: Vec<f64> = (0..50i32).map(|i| 3.0 * f64::from(i)).collect();
        let forest = RandomForest::fit(&x, &y, ForestTask::Regression, &params()).unwrap();
        let imp = forest.feature_importances();
        assert!((imp[0] - 1.0).abs() < 1e-9);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let x: Vec<Vec<f64>> = (0..40i32)
            .map(|i| vec![f64::from(i % 7), f64::from(i % 3)])
            .collect();
        let y: Vec<f64> = (0..40i32).map(|i| f64::from(i % 7 + i % 3)).collect();
        let a = RandomForest::fit(&x, &y, ForestTask::Regression, &params()).unwrap();
        let b = RandomForest::fit(&x, &y, ForestTask::Regression, &params()).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_rejects_bad_class_codes() {
        let x = vec![vec![1.0], vec![2.0]];
        let y = vec![0.0, 5.0];
        assert!(RandomForest::fit(&x, &y, ForestTask::Classification { n_classes: 2 }, &params())
            .is_none());
    }
}
