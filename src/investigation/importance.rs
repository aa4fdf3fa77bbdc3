//! Feature Importance Aggregator
//!
//! Fits a random forest over the accepted hypothesis features and folds the importances of
//! one-hot encoded columns back onto their source feature.

use super::encoding::{encoded_belongs_to, row_has_missing, OneHotEncoder};
use super::forest::{ForestParams, ForestTask, RandomForest};
use crate::config::ImportanceConfig;
use crate::types::{DataFrame, ModelType, TargetType};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceOutcome {
    /// Importance per source feature. Empty when the fit was aborted.
    pub importances: BTreeMap<String, f64>,
    pub model_type: ModelType,
    pub rows_used: usize,
}

impl ImportanceOutcome {
    fn aborted(rows_used: usize) -> Self {
        Self {
            importances: BTreeMap::new(),
            model_type: ModelType::None,
            rows_used,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.model_type == ModelType::None
    }
}

#[derive(Debug, Clone)]
pub struct ImportanceAggregator {
    cfg: ImportanceConfig,
}

impl ImportanceAggregator {
    pub fn new(cfg: &ImportanceConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    pub const fn min_rows(&self) -> usize {
        self.cfg.min_rows
    }

    /// Fits the forest and maps importances onto `features`.
    ///
    /// Rows with a missing value in any feature or the target are dropped first; for a
    /// regression target rows whose target is not numeric are dropped too. Fewer than
    /// `min_rows` remaining rows aborts with an empty mapping.
    pub fn fit_importance(
        &self,
        frame: &DataFrame,
        features: &[String],
        target_column: &str,
        target_type: TargetType,
    ) -> ImportanceOutcome {
        let features: Vec<String> = features
            .iter()
            .filter(|f| f.as_str() != target_column && frame.has_column(f))
            .cloned()
            .collect();
        let Some(target) = frame.column(target_column) else {
            return ImportanceOutcome::aborted(0);
        };
        if features.is_empty() {
            return ImportanceOutcome::aborted(0);
        }

        let mut subset = features.clone();
        subset.push(target_column.to_string());
        let target_numeric = target.parse_numeric();
        let keep: Vec<bool> = (0..frame.row_count())
            .map(|r| {
                !row_has_missing(frame, &subset, r)
                    && (target_type == TargetType::Classification || target_numeric[r].is_some())
            })
            .collect();
        let training = frame.filter_rows(&keep);

        if training.row_count() < self.cfg.min_rows {
            debug!(
                rows = training.row_count(),
                required = self.cfg.min_rows,
                "Skipping feature importance: too few complete rows"
            );
            return ImportanceOutcome::aborted(training.row_count());
        }

        let encoder = OneHotEncoder::fit(&training, &features, false);
        let x = encoder.transform(&training);
        let Some(target) = training.column(target_column) else {
            return ImportanceOutcome::aborted(training.row_count());
        };

        let (y, task) = match target_type {
            TargetType::Classification => {
                let labels: Vec<String> = target.labels().into_iter().flatten().collect();
                let classes: Vec<&String> = labels.iter().collect::<BTreeSet<_>>().into_iter().collect();
                let codes = labels
                    .iter()
                    .filter_map(|l| classes.binary_search(&l).ok().map(|c| c as f64))
                    .collect::<Vec<_>>();
                (
                    codes,
                    ForestTask::Classification {
                        n_classes: classes.len(),
                    },
                )
            }
            TargetType::Regression => (
                target.parse_numeric().into_iter().flatten().collect(),
                ForestTask::Regression,
            ),
        };

        let params = ForestParams {
            n_trees: self.cfg.n_trees,
            max_depth: self.cfg.max_depth,
            min_samples_split: self.cfg.min_samples_split,
            seed: self.cfg.seed,
        };
        let Some(forest) = RandomForest::fit(&x, &y, task, &params) else {
            debug!("Skipping feature importance: forest could not be fitted");
            return ImportanceOutcome::aborted(training.row_count());
        };

        let encoded_names = encoder.encoded_names();
        let importances = fold_importances(&features, &encoded_names, forest.feature_importances());

        info!(
            target_column = %target_column,
            rows = training.row_count(),
            encoded_columns = encoded_names.len(),
            trees = forest.n_trees(),
            "Feature importances fitted"
        );

        ImportanceOutcome {
            importances,
            model_type: ModelType::for_target(target_type),
            rows_used: training.row_count(),
        }
    }
}

impl Default for ImportanceAggregator {
    fn default() -> Self {
        Self::new(&ImportanceConfig::default())
    }
}

/// Sums encoded-column importances onto the features they came from. Features without a
/// matching encoded column get 0.0.
pub fn fold_importances(
    features: &[String],
    encoded_names: &[String],
    encoded_importances: &[f64],
) -> BTreeMap<String, f64> {
    features
        .iter()
        .map(|feature| {
            let total = encoded_names
                .iter()
                .zip(encoded_importances)
                .filter(|(name, _)| encoded_belongs_to(name, feature))
                .map(|(_, imp)| imp)
                .sum();
            (feature.clone(), total)
        })
        .collect()
}
