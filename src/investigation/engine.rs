//! Investigation runner: hypotheses → statistical tests → importances → ranking → answer.

use super::hypotheses::{HypothesisGenerator, ProfileHypothesisGenerator};
use super::importance::ImportanceAggregator;
use super::ranking::DriverRankingEngine;
use super::selector::TestSelector;
use super::synthesis::{InsightSynthesizer, TemplateSynthesizer};
use super::target::infer_target_type;
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::types::{
    DataFrame, DatasetProfile, DriverScore, FinalAnalysisAnswer, Hypothesis, ModelType,
    StatisticalResultBundle, TargetType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one investigation run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationReport {
    pub target_column: String,
    pub target_type: TargetType,
    pub hypotheses: Vec<Hypothesis>,
    pub bundle: StatisticalResultBundle,
    pub drivers: Vec<DriverScore>,
    pub answer: FinalAnalysisAnswer,
}

/// Owns the stages of the investigation path and runs them in order.
#[derive(Clone)]
pub struct InvestigationEngine {
    selector: TestSelector,
    aggregator: ImportanceAggregator,
    ranking: DriverRankingEngine,
    generator: Arc<dyn HypothesisGenerator>,
    synthesizer: Arc<dyn InsightSynthesizer>,
    classification_cardinality: usize,
}

impl std::fmt::Debug for InvestigationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestigationEngine")
            .field("generator", &self.generator.name())
            .field("synthesizer", &self.synthesizer.name())
            .finish_non_exhaustive()
    }
}

impl InvestigationEngine {
    pub fn new(cfg: &StudioConfig) -> Self {
        Self {
            selector: TestSelector::new(&cfg.statistics),
            aggregator: ImportanceAggregator::new(&cfg.importance),
            ranking: DriverRankingEngine::new(&cfg.ranking),
            generator: Arc::new(ProfileHypothesisGenerator),
            synthesizer: Arc::new(TemplateSynthesizer),
            classification_cardinality: cfg.statistics.classification_cardinality,
        }
    }

    /// Engine built from the global configuration.
    pub fn from_global() -> Self {
        Self::new(crate::config::get())
    }

    pub fn with_hypothesis_generator(mut self, generator: Arc<dyn HypothesisGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn InsightSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn ranking(&self) -> &DriverRankingEngine {
        &self.ranking
    }

    /// Classification when the target is non-numeric or has few distinct values.
    pub fn target_type(&self, frame: &DataFrame, target_column: &str) -> StudioResult<TargetType> {
        let column = frame
            .column(target_column)
            .ok_or_else(|| StudioError::TargetNotFound(target_column.to_string()))?;
        Ok(infer_target_type(column, self.classification_cardinality))
    }

    fn check_target(frame: &DataFrame, target_column: &str) -> StudioResult<()> {
        if frame.is_empty() {
            return Err(StudioError::MissingDataFrame);
        }
        let column = frame
            .column(target_column)
            .ok_or_else(|| StudioError::TargetNotFound(target_column.to_string()))?;
        if column.missing_count() == column.len() {
            return Err(StudioError::InvalidTarget {
                column: target_column.to_string(),
                reason: "every value is missing".to_string(),
            });
        }
        Ok(())
    }

    /// Tests every hypothesis feature and attaches forest importances.
    ///
    /// Features that fail a sample guard are dropped and counted in a quality flag.
    pub fn run_statistics(
        &self,
        frame: &DataFrame,
        hypotheses: &[Hypothesis],
        target_column: &str,
        target_type: TargetType,
    ) -> StudioResult<StatisticalResultBundle> {
        Self::check_target(frame, target_column)?;
        let target = frame
            .column(target_column)
            .ok_or_else(|| StudioError::TargetNotFound(target_column.to_string()))?;

        let mut flags = Vec::new();
        if target.missing_count() > 0 {
            flags.push("target has missing values".to_string());
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut skipped = 0usize;
        for hypothesis in hypotheses {
            let name = hypothesis.feature.as_str();
            if name == target_column || !seen.insert(name) {
                continue;
            }
            let Some(feature) = frame.column(name) else {
                debug!(feature = %name, "Hypothesis feature not in dataset");
                skipped += 1;
                continue;
            };
            match self.selector.evaluate(feature, target, target_type) {
                Some(result) => results.push(result),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            flags.push(format!("{skipped} hypothesis features skipped by sample guards"));
        }

        let mut model_type_used = ModelType::None;
        if !results.is_empty() {
            let accepted: Vec<String> = results.iter().map(|r| r.feature.clone()).collect();
            let outcome =
                self.aggregator
                    .fit_importance(frame, &accepted, target_column, target_type);
            if outcome.is_aborted() {
                if outcome.rows_used < self.aggregator.min_rows() {
                    flags.push(format!(
                        "feature importance skipped: fewer than {} complete rows",
                        self.aggregator.min_rows()
                    ));
                } else {
                    flags.push("feature importance skipped: model could not be fitted".to_string());
                }
            } else {
                model_type_used = outcome.model_type;
                for result in &mut results {
                    result.feature_importance = outcome.importances.get(&result.feature).copied();
                }
            }
        }

        info!(
            target_column = %target_column,
            target_type = %target_type,
            tested = results.len(),
            skipped,
            "Statistical testing complete"
        );

        Ok(StatisticalResultBundle {
            target_column: target_column.to_string(),
            target_type,
            model_type_used,
            data_quality_flags: flags,
            results,
        })
    }

    /// Full investigation for one target.
    pub fn investigate(
        &self,
        frame: &DataFrame,
        profile: &DatasetProfile,
        target_column: &str,
        question: &str,
    ) -> StudioResult<InvestigationReport> {
        Self::check_target(frame, target_column)?;
        let target_type = self.target_type(frame, target_column)?;

        let hypotheses = self.generator.generate(profile, target_column, target_type);
        debug!(
            generator = self.generator.name(),
            count = hypotheses.len(),
            "Hypotheses generated"
        );

        let bundle = self.run_statistics(frame, &hypotheses, target_column, target_type)?;
        let drivers = self.ranking.rank(&bundle);
        let answer = self.synthesizer.synthesize(
            question,
            target_column,
            target_type,
            &drivers,
            &bundle,
        );

        info!(
            target_column = %target_column,
            drivers = drivers.len(),
            top = drivers.first().map_or("-", |d| d.feature.as_str()),
            "Investigation complete"
        );

        Ok(InvestigationReport {
            target_column: target_column.to_string(),
            target_type,
            hypotheses,
            bundle,
            drivers,
            answer,
        })
    }
}

impl Default for InvestigationEngine {
    fn default() -> Self {
        Self::new(&StudioConfig::default())
    }
}
