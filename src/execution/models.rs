//! Baseline models for TRAIN_MODEL / EVALUATE_MODEL and their metrics.

use super::StepError;
use crate::config::ExecutionConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

// ============================================================================
// Train/Test Split
// ============================================================================

/// Row indices of a shuffled train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with `seed` and holds out `ceil(test_fraction * n)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split, StepError> {
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(StepError::InsufficientRows {
            available: n,
            required: 2,
        });
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let test = order.split_off(n - n_test);
    Ok(Split { train: order, test })
}

// ============================================================================
// Logistic Regression
// ============================================================================

/// Multinomial logistic regression on standardized features, fitted by full-batch gradient
/// descent with an L2 penalty of strength `1 / C`.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    scaler: Scaler,
}

impl LogisticRegression {
    /// `y` holds class codes `0..n_classes`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        cfg: &ExecutionConfig,
    ) -> Result<Self, StepError> {
        let present: BTreeSet<usize> = y.iter().copied().collect();
        if present.len() < 2 {
            return Err(StepError::SingleClass);
        }

        let scaler = Scaler::fit(x);
        let xs: Vec<Vec<f64>> = x.iter().map(|r| scaler.apply(r)).collect();
        let n = xs.len() as f64;
        let d = xs.first().map_or(0, Vec::len);
        let penalty = if cfg.logistic_l2 > 0.0 {
            1.0 / (cfg.logistic_l2 * n)
        } else {
            0.0
        };

        let mut weights = vec![vec![0.0; d]; n_classes];
        let mut bias = vec![0.0; n_classes];
        for _ in 0..cfg.logistic_max_iter {
            let mut grad_w = vec![vec![0.0; d]; n_classes];
            let mut grad_b = vec![0.0; n_classes];
            for (row, &label) in xs.iter().zip(y) {
                let probs = softmax(&weights, &bias, row);
                for (k, p) in probs.iter().enumerate() {
                    let err = p - if k == label { 1.0 } else { 0.0 };
                    grad_b[k] += err;
                    for (g, v) in grad_w[k].iter_mut().zip(row) {
                        *g += err * v;
                    }
                }
            }
            for k in 0..n_classes {
                bias[k] -= cfg.logistic_learning_rate * grad_b[k] / n;
                for j in 0..d {
                    let g = grad_w[k][j] / n + penalty * weights[k][j];
                    weights[k][j] -= cfg.logistic_learning_rate * g;
                }
            }
        }

        if weights.iter().flatten().chain(&bias).any(|w| !w.is_finite()) {
            return Err(StepError::Numeric("logistic regression diverged".to_string()));
        }
        Ok(Self {
            weights,
            bias,
            scaler,
        })
    }

    pub fn predict(&self, row: &[f64]) -> usize {
        let probs = softmax(&self.weights, &self.bias, &self.scaler.apply(row));
        let mut best = 0;
        for (k, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = k;
            }
        }
        best
    }
}

fn softmax(weights: &[Vec<f64>], bias: &[f64], row: &[f64]) -> Vec<f64> {
    let logits: Vec<f64> = weights
        .iter()
        .zip(bias)
        .map(|(w, b)| b + w.iter().zip(row).map(|(a, v)| a * v).sum::<f64>())
        .collect();
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Per-column standardization learned from training rows. Constant columns are centered only.
#[derive(Debug, Clone)]
struct Scaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Scaler {
    fn fit(x: &[Vec<f64>]) -> Self {
        let d = x.first().map_or(0, Vec::len);
        let n = x.len().max(1) as f64;
        let means: Vec<f64> = (0..d).map(|j| x.iter().map(|r| r[j]).sum::<f64>() / n).collect();
        let scales = (0..d)
            .map(|j| {
                let var = x.iter().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    var.sqrt()
                } else {
                    1.0
                }
            })
            .collect();
        Self { means, scales }
    }

    fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

// ============================================================================
// Linear Regression
// ============================================================================

/// Ordinary least squares with intercept, solved from the normal equations.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, StepError> {
        let d = x.first().map_or(0, Vec::len) + 1;
        let mut xtx = vec![vec![0.0; d]; d];
        let mut xty = vec![0.0; d];
        for (row, &target) in x.iter().zip(y) {
            let full: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..d {
                xty[i] += full[i] * target;
                for j in 0..d {
                    xtx[i][j] += full[i] * full[j];
                }
            }
        }

        let beta = solve(xtx.clone(), xty.clone())
            .or_else(|| {
                // near-singular design (collinear dummies): tiny ridge on the coefficients
                let mut ridged = xtx;
                for (i, row) in ridged.iter_mut().enumerate().skip(1) {
                    row[i] += 1e-8;
                }
                solve(ridged, xty)
            })
            .ok_or_else(|| StepError::Numeric("singular design matrix".to_string()))?;

        Ok(Self {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut out = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    out.iter().all(|v| v.is_finite()).then_some(out)
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision_weighted: f64,
    pub recall_weighted: f64,
    pub f1_weighted: f64,
}

/// Accuracy plus support-weighted precision, recall and F1. Undefined ratios count as 0.
pub fn classification_metrics(y_true: &[usize], y_pred: &[usize]) -> ClassificationMetrics {
    let n = y_true.len();
    if n == 0 {
        return ClassificationMetrics {
            accuracy: 0.0,
            precision_weighted: 0.0,
            recall_weighted: 0.0,
            f1_weighted: 0.0,
        };
    }
    let correct = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();

    let labels: BTreeSet<usize> = y_true.iter().chain(y_pred).copied().collect();
    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for label in labels {
        let tp = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == label && **p == label)
            .count() as f64;
        let predicted = y_pred.iter().filter(|p| **p == label).count() as f64;
        let support = y_true.iter().filter(|t| **t == label).count() as f64;

        let p = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let r = if support > 0.0 { tp / support } else { 0.0 };
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        let weight = support / n as f64;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    ClassificationMetrics {
        accuracy: correct as f64 / n as f64,
        precision_weighted: precision,
        recall_weighted: recall,
        f1_weighted: f1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// `None` with fewer than two test rows
    pub r2: Option<f64>,
}

/// MAE, RMSE and R². A constant `y_true` scores R² = 1 for a perfect fit, else 0.
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
    let n = y_true.len().max(1) as f64;
    let mae = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum::<f64>() / n;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let rmse = (ss_res / n).sqrt();

    let r2 = (y_true.len() >= 2).then(|| {
        let mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
        if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    });

    RegressionMetrics { mae, rmse, r2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_and_determinism() {
        let a = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 8);
        assert_eq!(a, train_test_split(10, 0.2, 42).unwrap());

        let odd = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(odd.test.len(), 3);
        assert!(train_test_split(1, 0.2, 42).is_err());
    }

    #[test]
    fn test_linear_regression_recovers_line() {
        let x: Vec<Vec<f64>> = (0..20i32).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..20i32).map(|i| 3.0 + 2.0 * f64::from(i)).collect();
        let model = LinearRegression::fit(&x, &y).unwrap();
        assert!((model.predict(&[10.0]) - 23.0).abs() < 1e-6);
    }

    #[test]
    fn test_logistic_regression_separates() {
        let x: Vec<Vec<f64>> = (0..40i32).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let model = LogisticRegression::fit(&x, &y, 2, &ExecutionConfig::default()).unwrap();
        assert_eq!(model.predict(&[2.0]), 0);
        assert_eq!(model.predict(&[37.0]), 1);
    }

    #[test]
    fn test_logistic_single_class_rejected() {
        let x = vec![vec![1.0], vec![2.0]];
        let err = LogisticRegression::fit(&x, &[0, 0], 2, &ExecutionConfig::default()).unwrap_err();
        assert!(matches!(err, StepError::SingleClass));
    }

    #[test]
    fn test_classification_metrics_zero_division() {
        let m = classification_metrics(&[0, 0, 1, 1], &[0, 0, 0, 0]);
        assert_eq!(m.accuracy, 0.5);
        assert!((m.recall_weighted - 0.5).abs() < 1e-12);
        // class 1 is never predicted: its precision counts as 0
        assert!((m.precision_weighted - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_regression_metrics() {
        let m = regression_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]);
        assert!((m.mae - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.rmse - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((m.r2.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(regression_metrics(&[2.0], &[1.0]).r2, None);
    }
}
