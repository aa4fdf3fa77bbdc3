//! Insight synthesis boundary: turns a driver ranking into a natural-language answer.

use crate::types::{DriverScore, FinalAnalysisAnswer, StatisticalResultBundle, TargetType};

/// Confidence reported when no drivers were ranked.
pub const NO_DRIVER_CONFIDENCE: f64 = 0.32;

pub trait InsightSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        question: &str,
        target_column: &str,
        target_type: TargetType,
        drivers: &[DriverScore],
        bundle: &StatisticalResultBundle,
    ) -> FinalAnalysisAnswer;

    fn name(&self) -> &'static str;
}

/// Deterministic template-based synthesizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    fn evidence_line(driver: &DriverScore) -> String {
        let mut parts = vec![format!(
            "{} (strength {:.2})",
            driver.feature, driver.strength_score
        )];
        if let Some(p) = driver.p_value {
            parts.push(format!("p={p:.4}"));
        }
        if let Some(e) = driver.effect_size {
            parts.push(format!("effect={e:.3}"));
        }
        if let Some(i) = driver.feature_importance {
            parts.push(format!("importance={i:.3}"));
        }
        parts.join(", ")
    }

    fn no_drivers() -> FinalAnalysisAnswer {
        FinalAnalysisAnswer {
            direct_answer: "The system could not identify strong evidence-based drivers from the current dataset and target setup.".to_string(),
            key_drivers_summary: "No ranked drivers were produced.".to_string(),
            evidence_points: vec![
                "Insufficient statistical results after validation filters.".to_string(),
            ],
            business_impact: "Decision confidence remains low until stronger statistical signals are available.".to_string(),
            confidence_score: NO_DRIVER_CONFIDENCE,
            recommended_next_step: "Confirm target variable quality and increase usable sample size.".to_string(),
        }
    }
}

impl InsightSynthesizer for TemplateSynthesizer {
    fn synthesize(
        &self,
        _question: &str,
        target_column: &str,
        _target_type: TargetType,
        drivers: &[DriverScore],
        bundle: &StatisticalResultBundle,
    ) -> FinalAnalysisAnswer {
        let Some(top) = drivers.first() else {
            return Self::no_drivers();
        };

        let top3 = &drivers[..drivers.len().min(3)];
        let names: Vec<&str> = top3.iter().map(|d| d.feature.as_str()).collect();
        let mut evidence: Vec<String> = top3.iter().map(Self::evidence_line).collect();
        evidence.extend(
            bundle
                .data_quality_flags
                .iter()
                .map(|flag| format!("Data quality: {flag}")),
        );

        FinalAnalysisAnswer {
            direct_answer: format!(
                "The strongest driver for {target_column} is {}, supported by the highest combined statistical and model-based score ({:.2}).",
                top.feature, top.strength_score
            ),
            key_drivers_summary: format!(
                "Top drivers are {}. These variables consistently rank high across significance and predictive contribution.",
                names.join(", ")
            ),
            evidence_points: evidence,
            business_impact: "Prioritizing interventions on the top-ranked drivers is likely to create the fastest measurable movement in the target outcome.".to_string(),
            confidence_score: top.strength_score.clamp(0.45, 0.95),
            recommended_next_step: format!(
                "Validate the effect of {} on {target_column} across key segments before operational rollout.",
                top.feature
            ),
        }
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelType, SignificanceLabel};

    fn bundle() -> StatisticalResultBundle {
        StatisticalResultBundle {
            target_column: "churn".into(),
            target_type: TargetType::Classification,
            model_type_used: ModelType::RandomForestClassifier,
            data_quality_flags: vec!["target has missing values".into()],
            results: Vec::new(),
        }
    }

    fn driver(feature: &str, strength: f64) -> DriverScore {
        DriverScore {
            feature: feature.into(),
            strength_score: strength,
            importance_rank: 1,
            statistical_significance: SignificanceLabel::Strong,
            explanation_hint: "High model contribution".into(),
            p_value: Some(0.001),
            effect_size: Some(0.5),
            feature_importance: Some(0.4),
            correlation: None,
        }
    }

    #[test]
    fn test_empty_ranking_answer() {
        let answer =
            TemplateSynthesizer.synthesize("why?", "churn", TargetType::Classification, &[], &bundle());
        assert_eq!(answer.confidence_score, NO_DRIVER_CONFIDENCE);
        assert_eq!(answer.key_drivers_summary, "No ranked drivers were produced.");
    }

    #[test]
    fn test_answer_names_top_driver_and_clamps_confidence() {
        let drivers = vec![driver("tenure", 1.0), driver("plan", 0.3)];
        let answer = TemplateSynthesizer.synthesize(
            "why?",
            "churn",
            TargetType::Classification,
            &drivers,
            &bundle(),
        );
        assert!(answer.direct_answer.contains("tenure"));
        assert_eq!(answer.confidence_score, 0.95);
        assert_eq!(answer.evidence_points.len(), 3);
        assert!(answer.evidence_points[0].starts_with("tenure (strength 1.00), p=0.0010"));
    }
}
