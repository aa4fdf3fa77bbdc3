//! Driver Ranking Engine
//!
//! Combines significance, effect size, correlation and importance of each tested feature
//! into one score, normalizes against the strongest feature of the batch and assigns dense
//! ranks (1 = strongest, ties keep input order).

use crate::config::RankingConfig;
use crate::stats::round_to;
use crate::types::{DriverScore, SignificanceLabel, StatisticalFeatureResult, StatisticalResultBundle};

#[derive(Debug, Clone)]
pub struct DriverRankingEngine {
    cfg: RankingConfig,
}

impl DriverRankingEngine {
    pub fn new(cfg: &RankingConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Step function of the p-value; features without a p-value get the neutral default.
    pub fn significance(&self, p_value: Option<f64>) -> f64 {
        match p_value {
            None => self.cfg.null_p_value_significance,
            Some(p) if p <= 0.001 => 1.0,
            Some(p) if p <= 0.01 => 0.9,
            Some(p) if p <= 0.05 => 0.75,
            Some(p) if p <= 0.1 => 0.55,
            Some(_) => 0.25,
        }
    }

    /// Weighted raw score before batch normalization.
    pub fn raw_score(&self, result: &StatisticalFeatureResult) -> f64 {
        let capped = |v: Option<f64>| v.map_or(0.0, |x| x.abs().min(1.0));
        let score = self.cfg.significance_weight * self.significance(result.p_value)
            + self.cfg.effect_size_weight * capped(result.effect_size)
            + self.cfg.correlation_weight * capped(result.correlation)
            + self.cfg.importance_weight * capped(result.feature_importance);
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }

    /// Ranks every feature result of the bundle. An empty bundle yields an empty ranking.
    pub fn rank(&self, bundle: &StatisticalResultBundle) -> Vec<DriverScore> {
        let mut scored: Vec<(&StatisticalFeatureResult, f64)> = bundle
            .results
            .iter()
            .map(|r| (r, self.raw_score(r)))
            .collect();
        if scored.is_empty() {
            return Vec::new();
        }

        let max_raw = scored.iter().map(|(_, s)| *s).fold(0.0, f64::max);
        let divisor = if max_raw > 0.0 { max_raw } else { 1.0 };

        // stable: equal scores keep input order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (result, raw))| DriverScore {
                feature: result.feature.clone(),
                strength_score: round_to((raw / divisor).clamp(0.0, 1.0), 4),
                importance_rank: i + 1,
                statistical_significance: significance_label(result.p_value),
                explanation_hint: explanation_hint(result).to_string(),
                p_value: result.p_value,
                effect_size: result.effect_size,
                feature_importance: result.feature_importance,
                correlation: result.correlation,
            })
            .collect()
    }
}

impl Default for DriverRankingEngine {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

pub fn significance_label(p_value: Option<f64>) -> SignificanceLabel {
    match p_value {
        None => SignificanceLabel::NoPValue,
        Some(p) if p <= 0.01 => SignificanceLabel::Strong,
        Some(p) if p <= 0.05 => SignificanceLabel::Moderate,
        Some(_) => SignificanceLabel::Weak,
    }
}

/// First matching rule wins.
pub fn explanation_hint(result: &StatisticalFeatureResult) -> &'static str {
    let abs = |v: Option<f64>| v.map_or(0.0, f64::abs);
    if result.feature_importance.unwrap_or(0.0) > 0.2 {
        "High model contribution"
    } else if abs(result.correlation) > 0.4 {
        "Meaningful directional relationship"
    } else if abs(result.effect_size) > 0.3 {
        "Material segment effect"
    } else {
        "Signal present but moderate"
    }
}
