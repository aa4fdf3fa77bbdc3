//! Statistical Test Selector
//!
//! Chooses and runs the hypothesis test for one (feature, target) pair from the storage
//! kind of the feature and the target type:
//!
//! | target | feature | test | effect size | correlation |
//! |---|---|---|---|---|
//! | classification, 2 classes | numeric | Mann-Whitney U | \|Cohen's d\| | - |
//! | classification, >2 classes | numeric | one-way ANOVA | eta-squared | - |
//! | classification | categorical | chi-square | Cramér's V | - |
//! | regression | numeric | Pearson p-value | \|Pearson r\| | Spearman r |
//! | regression | categorical | one-way ANOVA | eta-squared | - |
//!
//! Pairs that cannot support a test (too few paired rows, a single class, groups below the
//! minimum size, zero variance) yield `None` and the feature is skipped.

use crate::config::StatisticsConfig;
use crate::stats::{
    chi_square_independence, cohens_d, cramers_v, eta_squared, mann_whitney_u, one_way_anova,
    pearson_test, round_to, spearman, ContingencyTable,
};
use crate::types::{Column, StatisticalFeatureResult, TargetType, TestType};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-feature confidence: `0.6 * (1 - min(p, 1)) + 0.4 * min(|effect|, 1)` when a p-value
/// exists, else `min(|effect|, 1)`. Rounded to 4 dp, always in [0, 1].
pub fn confidence_score(p_value: Option<f64>, effect_size: Option<f64>) -> f64 {
    let effect = effect_size.map_or(0.0, |e| e.abs().min(1.0));
    let score = match p_value {
        Some(p) => 0.6 * (1.0 - p.clamp(0.0, 1.0)) + 0.4 * effect,
        None => effect,
    };
    round_to(score.clamp(0.0, 1.0), 4)
}

/// Test type with its p-value, effect size and correlation.
type TestFields = (TestType, Option<f64>, Option<f64>, Option<f64>);

/// Paired non-missing values of a feature and the target.
enum Paired {
    NumericByLabel { x: Vec<f64>, labels: Vec<String> },
    LabelByLabel { x: Vec<String>, labels: Vec<String> },
    NumericByValue { x: Vec<f64>, y: Vec<f64> },
    LabelByValue { x: Vec<String>, y: Vec<f64> },
}

impl Paired {
    fn len(&self) -> usize {
        match self {
            Self::NumericByLabel { x, .. } | Self::NumericByValue { x, .. } => x.len(),
            Self::LabelByLabel { x, .. } | Self::LabelByValue { x, .. } => x.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestSelector {
    min_paired_samples: usize,
    min_group_size: usize,
}

impl TestSelector {
    pub fn new(cfg: &StatisticsConfig) -> Self {
        Self {
            min_paired_samples: cfg.min_paired_samples,
            min_group_size: cfg.min_group_size,
        }
    }

    /// Tests `feature` against `target`. `None` means the feature is skipped.
    pub fn evaluate(
        &self,
        feature: &Column,
        target: &Column,
        target_type: TargetType,
    ) -> Option<StatisticalFeatureResult> {
        let paired = Self::pair(feature, target, target_type);
        if paired.len() < self.min_paired_samples {
            debug!(
                feature = %feature.name,
                paired = paired.len(),
                required = self.min_paired_samples,
                "Skipping feature: too few paired observations"
            );
            return None;
        }

        let outcome = match paired {
            Paired::NumericByLabel { x, labels } => self.numeric_vs_classes(&x, &labels),
            Paired::LabelByLabel { x, labels } => Self::categorical_vs_classes(&x, &labels),
            Paired::NumericByValue { x, y } => Self::numeric_vs_numeric(&x, &y),
            Paired::LabelByValue { x, y } => self.groups_anova(&x, &y),
        };

        let Some((test_type, p_value, effect_size, correlation)) = outcome else {
            debug!(feature = %feature.name, target_column = %target.name, "Skipping feature: degenerate test input");
            return None;
        };

        Some(StatisticalFeatureResult {
            feature: feature.name.clone(),
            test_type,
            p_value,
            effect_size,
            correlation,
            feature_importance: None,
            confidence_score: confidence_score(p_value, effect_size),
        })
    }

    fn pair(feature: &Column, target: &Column, target_type: TargetType) -> Paired {
        let rows = feature.len().min(target.len());
        match target_type {
            TargetType::Classification => {
                let target_labels = target.labels();
                if let Some(values) = feature.as_numeric() {
                    let (x, labels) = (0..rows)
                        .filter_map(|r| Some((values[r]?, target_labels[r].clone()?)))
                        .unzip();
                    Paired::NumericByLabel { x, labels }
                } else {
                    let feature_labels = feature.labels();
                    let (x, labels) = (0..rows)
                        .filter_map(|r| Some((feature_labels[r].clone()?, target_labels[r].clone()?)))
                        .unzip();
                    Paired::LabelByLabel { x, labels }
                }
            }
            TargetType::Regression => {
                let target_values = target.parse_numeric();
                if let Some(values) = feature.as_numeric() {
                    let (x, y) = (0..rows)
                        .filter_map(|r| Some((values[r]?, target_values[r]?)))
                        .unzip();
                    Paired::NumericByValue { x, y }
                } else {
                    let feature_labels = feature.labels();
                    let (x, y) = (0..rows)
                        .filter_map(|r| Some((feature_labels[r].clone()?, target_values[r]?)))
                        .unzip();
                    Paired::LabelByValue { x, y }
                }
            }
        }
    }

    /// Groups `values` by label, in label order.
    fn group_by_label<'a>(labels: &'a [String], values: &[f64]) -> BTreeMap<&'a str, Vec<f64>> {
        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (label, &v) in labels.iter().zip(values) {
            groups.entry(label.as_str()).or_default().push(v);
        }
        groups
    }

    fn numeric_vs_classes(
        &self,
        x: &[f64],
        labels: &[String],
    ) -> Option<TestFields> {
        let groups = Self::group_by_label(labels, x);
        match groups.len() {
            0 | 1 => None,
            2 => {
                let mut it = groups.values();
                let group_a = it.next()?;
                let group_b = it.next()?;
                if group_a.len() < self.min_group_size || group_b.len() < self.min_group_size {
                    return None;
                }
                let test = mann_whitney_u(group_a, group_b)?;
                let d = cohens_d(group_a, group_b)?;
                Some((TestType::MannWhitneyU, Some(test.p_value), Some(d.abs()), None))
            }
            _ => {
                let kept: Vec<Vec<f64>> = groups
                    .into_values()
                    .filter(|g| g.len() >= self.min_group_size)
                    .collect();
                if kept.len() < 2 {
                    return None;
                }
                let test = one_way_anova(&kept)?;
                Some((TestType::Anova, Some(test.p_value), Some(eta_squared(&kept)), None))
            }
        }
    }

    fn categorical_vs_classes(
        x: &[String],
        labels: &[String],
    ) -> Option<TestFields> {
        let table = ContingencyTable::from_pairs(
            x.iter().map(String::as_str).zip(labels.iter().map(String::as_str)),
        );
        let (rows, cols) = table.shape();
        if rows < 2 || cols < 2 {
            return None;
        }
        let test = chi_square_independence(&table)?;
        let v = cramers_v(test.statistic, x.len(), rows, cols);
        Some((TestType::ChiSquare, Some(test.p_value), Some(v), None))
    }

    fn numeric_vs_numeric(
        x: &[f64],
        y: &[f64],
    ) -> Option<TestFields> {
        let (r, p) = pearson_test(x, y)?;
        let rho = spearman(x, y).filter(|s| s.is_finite()).unwrap_or(r);
        Some((TestType::PearsonSpearman, Some(p), Some(r.abs()), Some(rho)))
    }

    fn groups_anova(
        &self,
        x: &[String],
        y: &[f64],
    ) -> Option<TestFields> {
        let kept: Vec<Vec<f64>> = Self::group_by_label(x, y)
            .into_values()
            .filter(|g| g.len() >= self.min_group_size)
            .collect();
        if kept.len() < 2 {
            return None;
        }
        let test = one_way_anova(&kept)?;
        Some((TestType::Anova, Some(test.p_value), Some(eta_squared(&kept)), None))
    }
}

impl Default for TestSelector {
    fn default() -> Self {
        Self::new(&StatisticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> TestSelector {
        TestSelector::default()
    }

    #[test]
    fn test_too_few_pairs_is_skipped() {
        let x = Column::from_f64("x", &[1.0; 11]);
        let y = Column::from_f64("y", &[2.0; 11]);
        assert!(selector().evaluate(&x, &y, TargetType::Regression).is_none());
    }

    #[test]
    fn test_missing_cells_reduce_pairs() {
        let mut xs: Vec<Option<f64>> = (0..12i32).map(|i| Some(f64::from(i))).collect();
        xs[0] = None;
        let x = Column::numeric("x", xs);
        let y = Column::from_f64("y", &(0..12i32).map(|i| f64::from(i) * 2.0).collect::<Vec<_>>());
        assert!(selector().evaluate(&x, &y, TargetType::Regression).is_none());
    }

    #[test]
    fn test_numeric_regression_uses_pearson_spearman() {
        let xs: Vec<f64> = (0..20i32).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|v| v * v).collect();
        let r = selector()
            .evaluate(
                &Column::from_f64("x", &xs),
                &Column::from_f64("y", &ys),
                TargetType::Regression,
            )
            .unwrap();
        assert_eq!(r.test_type, TestType::PearsonSpearman);
        assert!((r.correlation.unwrap() - 1.0).abs() < 1e-12);
        assert!(r.effect_size.unwrap() > 0.9 && r.effect_size.unwrap() < 1.0);
        assert!(r.p_value.unwrap() < 0.001);
    }

    #[test]
    fn test_single_class_is_skipped() {
        let x = Column::from_f64("x", &(0..15i32).map(f64::from).collect::<Vec<_>>());
        let y = Column::from_strs("y", &["yes"; 15]);
        assert!(selector().evaluate(&x, &y, TargetType::Classification).is_none());
    }

    #[test]
    fn test_small_group_is_skipped() {
        let x = Column::from_f64("x", &(0..14i32).map(f64::from).collect::<Vec<_>>());
        let mut labels = vec!["a"; 12];
        labels.extend(["b", "b"]);
        let y = Column::from_strs("y", &labels);
        assert!(selector().evaluate(&x, &y, TargetType::Classification).is_none());
    }

    #[test]
    fn test_multiclass_numeric_uses_anova() {
        let xs: Vec<f64> = (0..30i32).map(|i| f64::from(i % 3) * 10.0 + f64::from(i % 4)).collect();
        let labels: Vec<&str> = (0..30).map(|i| ["a", "b", "c"][i % 3]).collect();
        let r = selector()
            .evaluate(
                &Column::from_f64("x", &xs),
                &Column::from_strs("y", &labels),
                TargetType::Classification,
            )
            .unwrap();
        assert_eq!(r.test_type, TestType::Anova);
        let eta = r.effect_size.unwrap();
        assert!((0.0..=1.0).contains(&eta) && eta > 0.8);
        assert!(r.correlation.is_none());
    }

    #[test]
    fn test_categorical_classification_uses_chi_square() {
        let xs: Vec<&str> = (0..40).map(|i| if i < 20 { "north" } else { "south" }).collect();
        let ys: Vec<&str> = (0..40)
            .map(|i| if (i < 18) || (20..22).contains(&i) { "yes" } else { "no" })
            .collect();
        let r = selector()
            .evaluate(
                &Column::from_strs("region", &xs),
                &Column::from_strs("bought", &ys),
                TargetType::Classification,
            )
            .unwrap();
        assert_eq!(r.test_type, TestType::ChiSquare);
        let v = r.effect_size.unwrap();
        assert!((0.0..=1.0).contains(&v) && v > 0.5);
    }

    #[test]
    fn test_categorical_regression_excludes_small_groups() {
        let mut xs = vec!["a"; 10];
        xs.extend(vec!["b"; 10]);
        xs.extend(["c", "c"]);
        let ys: Vec<f64> = (0..22i32)
            .map(|i| if i < 10 { 1.0 + f64::from(i) * 0.1 } else { 5.0 + f64::from(i) * 0.1 })
            .collect();
        let r = selector()
            .evaluate(
                &Column::from_strs("segment", &xs),
                &Column::from_f64("spend", &ys),
                TargetType::Regression,
            )
            .unwrap();
        assert_eq!(r.test_type, TestType::Anova);
        assert!(r.p_value.unwrap() < 0.001);
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(Some(0.0), Some(2.0)), 1.0);
        assert_eq!(confidence_score(None, Some(0.25)), 0.25);
        assert_eq!(confidence_score(Some(1.0), None), 0.0);
    }
}
