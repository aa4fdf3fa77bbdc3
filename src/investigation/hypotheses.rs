//! Hypothesis generation boundary.
//!
//! The default generator derives hypotheses from the profile alone: every usable column
//! other than the target becomes one candidate.

use crate::types::{ColumnRole, DatasetProfile, Hypothesis, HypothesisKind, TargetType};

/// Proposes (feature, target) relationships to test.
pub trait HypothesisGenerator: Send + Sync {
    fn generate(
        &self,
        profile: &DatasetProfile,
        target_column: &str,
        target_type: TargetType,
    ) -> Vec<Hypothesis>;

    fn name(&self) -> &'static str;
}

/// Profile-driven generator.
///
/// Identifier, free-text and datetime columns are skipped. Numeric metrics become
/// `correlation` hypotheses for a regression target and `classification_signal`
/// hypotheses for a classification target; categorical and boolean columns become
/// `group_difference` hypotheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileHypothesisGenerator;

impl HypothesisGenerator for ProfileHypothesisGenerator {
    fn generate(
        &self,
        profile: &DatasetProfile,
        target_column: &str,
        target_type: TargetType,
    ) -> Vec<Hypothesis> {
        profile
            .column_roles
            .iter()
            .filter(|(name, _)| name.as_str() != target_column)
            .filter_map(|(name, role)| {
                let (kind, description) = match (role, target_type) {
                    (ColumnRole::NumericMetric, TargetType::Regression) => (
                        HypothesisKind::Correlation,
                        format!("{name} is associated with variation in {target_column}."),
                    ),
                    (ColumnRole::NumericMetric, TargetType::Classification) => (
                        HypothesisKind::ClassificationSignal,
                        format!("{name} differs between {target_column} classes."),
                    ),
                    (ColumnRole::CategoricalDimension | ColumnRole::Boolean, _) => (
                        HypothesisKind::GroupDifference,
                        format!("Groups in {name} produce different {target_column} outcomes."),
                    ),
                    (ColumnRole::Identifier | ColumnRole::Text | ColumnRole::Datetime, _) => {
                        return None
                    }
                };
                Some(Hypothesis {
                    feature: name.clone(),
                    kind,
                    description,
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "profile"
    }
}
