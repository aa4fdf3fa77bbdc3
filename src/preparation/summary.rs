//! Dataset summary boundary and the opening message shown when analysis starts.

use super::domain::identifier_heavy;
use crate::stats::descriptive::round_to;
use crate::types::{ColumnRole, ColumnSummary, DatasetProfile, DatasetSummaryReport, DomainClassification};
use async_trait::async_trait;

/// Missing share (percent) above which a column is called out.
const HIGH_MISSING_PCT: f64 = 10.0;
const MAX_LISTED: usize = 5;

#[async_trait]
pub trait DatasetSummarizer: Send + Sync {
    /// `include_guidance` adds feature and statistic suggestions; it is set once the
    /// dataset has no missing values.
    async fn summarize(
        &self,
        profile: &DatasetProfile,
        domain: &DomainClassification,
        include_guidance: bool,
    ) -> DatasetSummaryReport;

    fn name(&self) -> &'static str;
}

/// Summary assembled from profile counts and column statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSummarizer;

fn metric_columns(profile: &DatasetProfile) -> Vec<&str> {
    profile
        .column_roles
        .iter()
        .filter(|(_, role)| **role == ColumnRole::NumericMetric)
        .map(|(name, _)| name.as_str())
        .collect()
}

fn high_missing(profile: &DatasetProfile) -> Vec<(&str, f64)> {
    profile
        .missing_percentage
        .iter()
        .filter(|(_, pct)| **pct > HIGH_MISSING_PCT)
        .map(|(name, pct)| (name.as_str(), *pct))
        .collect()
}

/// First entry with the highest share.
fn first_max<'a>(items: impl IntoIterator<Item = (&'a str, f64)>) -> Option<(&'a str, f64)> {
    items.into_iter().fold(None, |best, (name, pct)| match best {
        Some((_, top)) if top >= pct => best,
        _ => Some((name, pct)),
    })
}

fn most_missing(profile: &DatasetProfile) -> Option<(&str, f64)> {
    first_max(profile.missing_percentage.iter().map(|(name, pct)| (name.as_str(), *pct)))
}

fn join_first(names: &[String], n: usize) -> String {
    names.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

/// Lead-in sentence for the first assistant message after profiling.
pub fn dataset_opening(profile: &DatasetProfile) -> String {
    let metrics = metric_columns(profile);
    let mut parts = Vec::new();
    if !metrics.is_empty() {
        parts.push(format!(
            "This dataset appears to contain measurable business metrics such as {}.",
            metrics.iter().take(2).copied().collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(first) = profile.datetime_columns.first() {
        parts.push(format!("It spans a temporal dimension via {first}."));
    }
    if let Some((name, pct)) = first_max(high_missing(profile)) {
        parts.push(format!("{name} has {pct}% missing values, which may affect analysis."));
    }
    if parts.is_empty() {
        parts.push("The profile shows structured columns with limited explicit metric/time signals.".to_string());
    }
    parts.join(" ")
}

impl ProfileSummarizer {
    fn spread_signals(profile: &DatasetProfile, metrics: &[&str]) -> Vec<String> {
        let mut signals = Vec::new();
        for name in metrics {
            let Some(ColumnSummary::Numeric { min, max, std: sd, .. }) = profile.column_summary.get(*name)
            else {
                continue;
            };
            if let (Some(lo), Some(hi)) = (min, max) {
                signals.push(format!(
                    "{name} spans from {} to {}.",
                    round_to(*lo, 3),
                    round_to(*hi, 3)
                ));
            }
            if let Some(sd) = sd.filter(|s| *s > 0.0) {
                signals.push(format!("{name} has standard deviation {}.", round_to(sd, 3)));
            }
            if signals.len() >= 3 {
                break;
            }
        }
        signals.truncate(3);
        signals
    }

    pub fn summarize_profile(
        profile: &DatasetProfile,
        domain: &DomainClassification,
        include_guidance: bool,
    ) -> DatasetSummaryReport {
        let metrics = metric_columns(profile);
        let identifiers = profile
            .column_roles
            .values()
            .filter(|role| **role == ColumnRole::Identifier)
            .count();
        let missing_over: Vec<&str> = high_missing(profile).into_iter().map(|(n, _)| n).collect();
        let reference_like = identifier_heavy(profile);

        let mut highlights = vec![
            format!(
                "Dataset contains {} rows across {} columns.",
                profile.total_rows, profile.total_columns
            ),
            format!(
                "Role mix: {} metric, {} dimensions, {} datetime, {} identifiers.",
                metrics.len(),
                profile.categorical_columns.len(),
                profile.datetime_columns.len(),
                identifiers
            ),
        ];
        let spread = Self::spread_signals(profile, &metrics);
        if spread.is_empty() {
            highlights.push("Numeric spread signals are limited from available summaries.".to_string());
        } else {
            highlights.extend(spread);
        }

        let mut anomalies = Vec::new();
        if profile.duplicate_rows > 0 {
            anomalies.push(format!(
                "{} duplicate rows detected, indicating integrity risk.",
                profile.duplicate_rows
            ));
        }
        if !missing_over.is_empty() {
            anomalies.push(format!(
                "Missingness above 10% in {} columns: {}.",
                missing_over.len(),
                missing_over.iter().take(5).copied().collect::<Vec<_>>().join(", ")
            ));
        }
        if let Some((name, pct)) = most_missing(profile).filter(|(_, pct)| *pct > 0.0) {
            anomalies.push(format!("Highest missingness is {pct}% in column '{name}'."));
        }
        if anomalies.is_empty() {
            anomalies.push(
                "No critical anomaly signals detected from duplicates and missingness checks.".to_string(),
            );
        }

        let mut health = Vec::new();
        if profile.duplicate_rows > 0 {
            health.push("Duplicate rows require deduplication before deeper analysis.");
        }
        if !missing_over.is_empty() {
            health.push("Several columns exceed 10% missingness and need imputation strategy.");
        }
        if reference_like {
            health.push("Identifier-heavy structure suggests a lookup or reference-oriented table.");
        }
        if health.is_empty() {
            health.push("Core health signals are stable with low duplicates and manageable missingness.");
        }

        let mut starting_points = vec![
            format!(
                "Start with domain-oriented KPI baselining for {}.",
                domain.domain_label
            ),
            "Run segmented summaries on dimension columns against key metric columns.".to_string(),
        ];
        if !profile.datetime_columns.is_empty() {
            starting_points.push(format!(
                "Build trend views over datetime field(s): {}.",
                join_first(&profile.datetime_columns, 3)
            ));
        }
        if !profile.potential_primary_keys.is_empty() {
            starting_points.push(format!(
                "Use likely identifier(s) {} for record-level tracing.",
                join_first(&profile.potential_primary_keys, 3)
            ));
        }
        if !missing_over.is_empty() {
            starting_points
                .push("Prioritize missing-data treatment before diagnostic or predictive workflows.".to_string());
        }

        let (important_features, useful_statistics) = if include_guidance {
            Self::guidance(profile, &metrics)
        } else {
            (Vec::new(), Vec::new())
        };

        let executive_summary = format!(
            "This dataset is best described as {} data with {} rows and {} columns. \
             It includes {} measurable metric column(s) and {} time-oriented column(s).",
            domain.domain_label.to_lowercase(),
            profile.total_rows,
            profile.total_columns,
            metrics.len(),
            profile.datetime_columns.len()
        );

        highlights.truncate(MAX_LISTED);
        anomalies.truncate(MAX_LISTED);
        starting_points.truncate(MAX_LISTED);
        DatasetSummaryReport {
            executive_summary,
            data_health_assessment: health.join(" "),
            statistical_highlights: highlights,
            anomaly_indicators: anomalies,
            recommended_starting_points: starting_points,
            important_features,
            useful_statistics,
            confidence: 0.7,
        }
    }

    fn guidance(profile: &DatasetProfile, metrics: &[&str]) -> (Vec<String>, Vec<String>) {
        let mut features: Vec<String> = Vec::new();
        let candidates = metrics
            .iter()
            .take(6)
            .copied()
            .chain(profile.datetime_columns.iter().take(2).map(String::as_str))
            .chain(profile.categorical_columns.iter().take(4).map(String::as_str));
        for name in candidates {
            if !features.iter().any(|f| f == name) {
                features.push(name.to_string());
            }
        }
        features.truncate(10);

        let has_metrics = !metrics.is_empty();
        let has_dimensions = !profile.categorical_columns.is_empty();
        let mut stats = Vec::new();
        if has_metrics {
            stats.push("Distribution summary (mean, median, std, range) for key metric columns.");
            stats.push("Outlier checks using IQR or z-score on high-variance metrics.");
        }
        if has_dimensions {
            stats.push("Category-level frequency and concentration analysis for segment columns.");
        }
        if has_metrics && has_dimensions {
            stats.push("Group-wise comparison (ANOVA or Kruskal) between dimensions and metrics.");
        }
        if has_metrics && !profile.datetime_columns.is_empty() {
            stats.push("Time-series trend and seasonality checks for datetime-linked metrics.");
        }
        (features, stats.into_iter().map(str::to_string).collect())
    }
}

#[async_trait]
impl DatasetSummarizer for ProfileSummarizer {
    async fn summarize(
        &self,
        profile: &DatasetProfile,
        domain: &DomainClassification,
        include_guidance: bool,
    ) -> DatasetSummaryReport {
        Self::summarize_profile(profile, domain, include_guidance)
    }

    fn name(&self) -> &'static str {
        "profile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preparation::RoleDomainClassifier;
    use crate::profiling::DatasetProfiler;
    use crate::types::{Column, DataFrame};

    fn profile_with_gaps() -> DatasetProfile {
        let spend: Vec<Option<f64>> = (0..20i32)
            .map(|i| (i % 4 != 0).then(|| f64::from(i) * 2.5 + 0.5))
            .collect();
        let region: Vec<&str> = (0..20).map(|i| ["north", "south"][i % 2]).collect();
        let frame = DataFrame::new(vec![
            Column::numeric("spend", spend),
            Column::from_strs("region", &region),
        ])
        .unwrap();
        DatasetProfiler::new().profile(&frame)
    }

    #[test]
    fn test_summary_flags_missingness() {
        let profile = profile_with_gaps();
        let domain = RoleDomainClassifier::classify_profile(&profile);
        let report = ProfileSummarizer::summarize_profile(&profile, &domain, false);

        assert!(report.executive_summary.starts_with("This dataset is best described as business metrics dataset data"));
        assert!(report
            .anomaly_indicators
            .iter()
            .any(|a| a == "Highest missingness is 25% in column 'spend'."));
        assert!(report.data_health_assessment.contains("exceed 10% missingness"));
        assert!(report.important_features.is_empty());
        assert!(report.useful_statistics.is_empty());
        assert!(report.statistical_highlights.len() <= 5);
    }

    #[test]
    fn test_guidance_lists_features_and_statistics() {
        let profile = profile_with_gaps();
        let domain = RoleDomainClassifier::classify_profile(&profile);
        let report = ProfileSummarizer::summarize_profile(&profile, &domain, true);
        assert_eq!(report.important_features, vec!["spend", "region"]);
        assert_eq!(report.useful_statistics.len(), 4);
    }

    #[test]
    fn test_opening_mentions_worst_missing_column() {
        let opening = dataset_opening(&profile_with_gaps());
        assert_eq!(
            opening,
            "This dataset appears to contain measurable business metrics such as spend. \
             spend has 25% missing values, which may affect analysis."
        );
    }
}
