//! Domain classification boundary.

use crate::types::{ColumnRole, DatasetProfile, DomainClassification};
use async_trait::async_trait;

#[async_trait]
pub trait DomainClassifier: Send + Sync {
    async fn classify(&self, profile: &DatasetProfile, column_names: &[String]) -> DomainClassification;

    fn name(&self) -> &'static str;
}

/// Labels a dataset from the mix of column roles in its profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleDomainClassifier;

fn columns_with_role(profile: &DatasetProfile, role: ColumnRole) -> Vec<&str> {
    profile
        .column_roles
        .iter()
        .filter(|(_, r)| **r == role)
        .map(|(name, _)| name.as_str())
        .collect()
}

fn first(names: &[&str], n: usize) -> String {
    names.iter().take(n).copied().collect::<Vec<_>>().join(", ")
}

/// Identifier columns make up at least half of the schema.
pub(crate) fn identifier_heavy(profile: &DatasetProfile) -> bool {
    let identifiers = columns_with_role(profile, ColumnRole::Identifier).len();
    identifiers > 0 && identifiers >= (profile.total_columns / 2).max(1)
}

impl RoleDomainClassifier {
    pub fn classify_profile(profile: &DatasetProfile) -> DomainClassification {
        let metrics = columns_with_role(profile, ColumnRole::NumericMetric);
        let datetimes: Vec<&str> = profile.datetime_columns.iter().map(String::as_str).collect();

        let (label, confidence, reasoning, kpis) = if !datetimes.is_empty() && !metrics.is_empty() {
            (
                "Operational Time-Series Dataset",
                0.58,
                format!(
                    "Detected datetime column(s) {} and metric column(s) {}, indicating trend-ready operational data.",
                    first(&datetimes, 2),
                    first(&metrics, 2)
                ),
                ["Trend Growth Rate", "Period-over-Period Change", "Data Completeness"],
            )
        } else if !metrics.is_empty() {
            (
                "Business Metrics Dataset",
                0.52,
                format!(
                    "Detected measurable numeric metrics ({}) and categorical dimensions suitable for segmented KPI analysis.",
                    first(&metrics, 3)
                ),
                ["Metric Distribution", "Segment Performance", "Duplicate Row Rate"],
            )
        } else if identifier_heavy(profile) {
            (
                "Reference or Lookup Dataset",
                0.49,
                "Identifier columns dominate the schema, which suggests a reference-oriented table \
                 rather than a metric-heavy analytical dataset."
                    .to_string(),
                ["Identifier Coverage", "Completeness by Field", "Duplicate Identifier Rate"],
            )
        } else {
            (
                "Structured Dataset with Limited Domain Signals",
                0.36,
                "Available metadata contains limited metric/time signals, so domain confidence remains conservative."
                    .to_string(),
                ["Missing Data Rate", "Duplicate Row Rate", "Column Completeness"],
            )
        };

        DomainClassification {
            domain_label: label.to_string(),
            confidence,
            reasoning,
            suggested_kpis: kpis.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

#[async_trait]
impl DomainClassifier for RoleDomainClassifier {
    async fn classify(&self, profile: &DatasetProfile, _column_names: &[String]) -> DomainClassification {
        Self::classify_profile(profile)
    }

    fn name(&self) -> &'static str {
        "role"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::DatasetProfiler;
    use crate::types::{Column, DataFrame};

    #[test]
    fn test_time_series_when_dates_and_metrics() {
        let days: Vec<&str> = (0..12).map(|i| ["2024-01-01", "2024-01-02", "2024-01-03"][i % 3]).collect();
        let revenue: Vec<f64> = (0..12i32).map(|i| f64::from(i) * 1.5 + 0.25).collect();
        let frame = DataFrame::new(vec![
            Column::from_strs("day", &days),
            Column::from_f64("revenue", &revenue),
        ])
        .unwrap();
        let profile = DatasetProfiler::new().profile(&frame);
        let domain = RoleDomainClassifier::classify_profile(&profile);
        assert_eq!(domain.domain_label, "Operational Time-Series Dataset");
        assert!((domain.confidence - 0.58).abs() < 1e-12);
        assert!(domain.reasoning.contains("day"));
        assert_eq!(domain.suggested_kpis.len(), 3);
    }

    #[test]
    fn test_identifier_heavy_is_reference_table() {
        let frame = DataFrame::new(vec![
            Column::from_strs("sku_code", &["a1", "b2", "c3"]),
            Column::from_strs("colour", &["red", "red", "blue"]),
        ])
        .unwrap();
        let profile = DatasetProfiler::new().profile(&frame);
        let domain = RoleDomainClassifier::classify_profile(&profile);
        assert_eq!(domain.domain_label, "Reference or Lookup Dataset");
    }
}
