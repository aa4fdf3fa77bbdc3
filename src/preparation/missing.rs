//! Missing-value treatment: suggested solutions for a profile and their application.
//!
//! Suggestions are recomputed from the new profile after every applied solution, so a
//! solution disappears once nothing is left for it to fix.

use crate::stats::descriptive::median;
use crate::types::{
    parse_date, Column, ColumnData, ColumnRole, DataFrame, DatasetProfile, FrameError,
    MissingValueAction, MissingValueSolution, MissingValueTreatmentResult,
};
use tracing::debug;

/// Columns missing at least this share (percent) are offered for dropping.
const HIGH_MISSING_PCT: f64 = 40.0;
const UNKNOWN_LABEL: &str = "UNKNOWN";

const MODE_ROLES: [ColumnRole; 3] = [
    ColumnRole::CategoricalDimension,
    ColumnRole::Boolean,
    ColumnRole::Text,
];

fn columns_with_roles(profile: &DatasetProfile, roles: &[ColumnRole]) -> Vec<String> {
    profile
        .column_roles
        .iter()
        .filter(|(_, role)| roles.contains(role))
        .map(|(name, _)| name.clone())
        .collect()
}

fn solution(action: MissingValueAction, description: &str, target_columns: Vec<String>) -> MissingValueSolution {
    MissingValueSolution {
        solution_id: action.as_str().to_string(),
        title: action.title().to_string(),
        description: description.to_string(),
        action,
        target_columns,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MissingValueTreatment;

impl MissingValueTreatment {
    pub fn new() -> Self {
        Self
    }

    /// Solutions applicable to `profile`; empty when nothing is missing.
    pub fn suggest(&self, profile: &DatasetProfile) -> Vec<MissingValueSolution> {
        let missing: Vec<String> = profile
            .missing_percentage
            .iter()
            .filter(|(_, pct)| **pct > 0.0)
            .map(|(name, _)| name.clone())
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }
        let high: Vec<String> = profile
            .missing_percentage
            .iter()
            .filter(|(_, pct)| **pct >= HIGH_MISSING_PCT)
            .map(|(name, _)| name.clone())
            .collect();
        let with_gaps = |roles: &[ColumnRole]| -> Vec<String> {
            columns_with_roles(profile, roles)
                .into_iter()
                .filter(|c| missing.contains(c))
                .collect()
        };

        let mut solutions = vec![solution(
            MissingValueAction::SmartImpute,
            "Fill numeric metrics with median, categorical/text fields with mode, \
             and datetime columns with forward/backward fill.",
            missing.clone(),
        )];
        solutions.push(solution(
            MissingValueAction::DropHighMissingColumns,
            "Drop columns where missing percentage is 40% or higher.",
            high,
        ));
        solutions.push(solution(
            MissingValueAction::FillNumericMedian,
            "Apply median fill for numeric metric columns only.",
            with_gaps(&[ColumnRole::NumericMetric]),
        ));
        solutions.push(solution(
            MissingValueAction::FillCategoricalMode,
            "Apply mode fill for categorical and text-like columns.",
            with_gaps(&MODE_ROLES),
        ));
        solutions.push(solution(
            MissingValueAction::FillDatetimeFfill,
            "Propagate nearest valid datetime values forward then backward.",
            with_gaps(&[ColumnRole::Datetime]),
        ));

        solutions.retain(|s| !s.target_columns.is_empty());
        solutions
    }

    /// Applies `solution` to a copy of `frame`. Fills act on every column of the matching
    /// role; dropping acts on the solution's target columns.
    pub fn apply(
        &self,
        frame: &DataFrame,
        profile: &DatasetProfile,
        solution: &MissingValueSolution,
    ) -> Result<(DataFrame, MissingValueTreatmentResult), FrameError> {
        let mut treated = frame.clone();
        match solution.action {
            MissingValueAction::SmartImpute => {
                fill_numeric_median(&mut treated, profile)?;
                fill_mode(&mut treated, profile)?;
                fill_datetime(&mut treated, profile)?;
            }
            MissingValueAction::DropHighMissingColumns => {
                let keep: Vec<String> = treated
                    .column_names()
                    .into_iter()
                    .filter(|c| !solution.target_columns.contains(c))
                    .collect();
                treated = treated.select(&keep);
            }
            MissingValueAction::FillNumericMedian => fill_numeric_median(&mut treated, profile)?,
            MissingValueAction::FillCategoricalMode => fill_mode(&mut treated, profile)?,
            MissingValueAction::FillDatetimeFfill => fill_datetime(&mut treated, profile)?,
        }

        let affected_columns = if solution.action == MissingValueAction::DropHighMissingColumns {
            solution.target_columns.clone()
        } else {
            frame
                .columns()
                .iter()
                .filter(|before| {
                    treated
                        .column(&before.name)
                        .is_some_and(|after| after.missing_count() != before.missing_count())
                })
                .map(|c| c.name.clone())
                .collect()
        };

        let (missing_before, missing_after) = (frame.total_missing(), treated.total_missing());
        let result = MissingValueTreatmentResult {
            solution_id: solution.solution_id.clone(),
            rows_before: frame.row_count(),
            rows_after: treated.row_count(),
            missing_before,
            missing_after,
            affected_columns,
            summary: format!(
                "{} applied. Missing values reduced from {missing_before} to {missing_after}.",
                solution.title
            ),
        };
        debug!(
            solution = %solution.solution_id,
            missing_before,
            missing_after,
            "Missing-value solution applied"
        );
        Ok((treated, result))
    }
}

// ============================================================================
// Fills
// ============================================================================

fn fill_numeric_median(frame: &mut DataFrame, profile: &DatasetProfile) -> Result<(), FrameError> {
    for name in columns_with_roles(profile, &[ColumnRole::NumericMetric]) {
        let Some(values) = frame.column(&name).and_then(Column::as_numeric) else {
            continue;
        };
        if values.iter().all(Option::is_some) {
            continue;
        }
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let fill = median(&present).unwrap_or(0.0);
        let filled = values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
        frame.replace_column(Column::numeric(name, filled))?;
    }
    Ok(())
}

fn fill_mode(frame: &mut DataFrame, profile: &DatasetProfile) -> Result<(), FrameError> {
    for name in columns_with_roles(profile, &MODE_ROLES) {
        let Some(column) = frame.column(&name) else { continue };
        if column.missing_count() == 0 {
            continue;
        }
        let mode = column.mode().map(|(label, _)| label);
        let filled = match &column.data {
            ColumnData::Numeric(values) => {
                let Some(fill) = mode.and_then(|m| m.parse::<f64>().ok()) else {
                    continue;
                };
                Column::numeric(name, values.iter().map(|v| Some(v.unwrap_or(fill))).collect())
            }
            ColumnData::Categorical(values) => {
                let fill = mode.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
                Column::categorical(
                    name,
                    values
                        .iter()
                        .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
                        .collect(),
                )
            }
        };
        frame.replace_column(filled)?;
    }
    Ok(())
}

/// Unparseable dates count as missing; gaps take the previous valid value, leading gaps
/// the next one.
fn fill_datetime(frame: &mut DataFrame, profile: &DatasetProfile) -> Result<(), FrameError> {
    for name in columns_with_roles(profile, &[ColumnRole::Datetime]) {
        let Some(column) = frame.column(&name) else { continue };
        let ColumnData::Categorical(values) = &column.data else { continue };
        if column.missing_count() == 0 {
            continue;
        }

        let mut filled: Vec<Option<String>> = values
            .iter()
            .map(|v| v.clone().filter(|s| parse_date(s).is_some()))
            .collect();
        let mut last: Option<String> = None;
        for cell in &mut filled {
            match cell {
                Some(v) => last = Some(v.clone()),
                None => cell.clone_from(&last),
            }
        }
        let mut next: Option<String> = None;
        for cell in filled.iter_mut().rev() {
            match cell {
                Some(v) => next = Some(v.clone()),
                None => cell.clone_from(&next),
            }
        }
        frame.replace_column(Column::categorical(name, filled))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::DatasetProfiler;

    /// 15 rows: `score` (metric, 2 gaps), `segment` (dimension, 1 gap), `day` (datetime,
    /// a leading gap and one unparseable value), `notes` (60% missing).
    fn gappy_frame() -> DataFrame {
        let score: Vec<Option<f64>> = (0..10i32)
            .map(|i| (i != 2 && i != 7).then(|| f64::from(i) * 1.5 + 0.25))
            .chain((0..5i32).map(|i| Some(f64::from(i) * 3.5 + 40.25)))
            .collect();
        let segment: Vec<Option<String>> = (0..15)
            .map(|i| (i != 4).then(|| ["a", "b", "a"][i % 3].to_string()))
            .collect();
        let day: Vec<Option<String>> = (0..15)
            .map(|i| match i {
                0 => None,
                5 => Some("not a date".to_string()),
                _ => Some(format!("2024-01-{:02}", 1 + i % 3)),
            })
            .collect();
        let notes: Vec<Option<String>> = (0..15)
            .map(|i| (i % 5 < 2).then(|| ["x", "y"][i % 2].to_string()))
            .collect();
        DataFrame::new(vec![
            Column::numeric("score", score),
            Column::categorical("segment", segment),
            Column::categorical("day", day),
            Column::categorical("notes", notes),
        ])
        .unwrap()
    }

    fn find(solutions: &[MissingValueSolution], action: MissingValueAction) -> &MissingValueSolution {
        solutions.iter().find(|s| s.action == action).unwrap()
    }

    #[test]
    fn test_suggestions_cover_each_role() {
        let profile = DatasetProfiler::new().profile(&gappy_frame());
        let solutions = MissingValueTreatment::new().suggest(&profile);

        assert_eq!(solutions[0].action, MissingValueAction::SmartImpute);
        assert_eq!(solutions[0].solution_id, "SMART_IMPUTE");
        assert_eq!(
            find(&solutions, MissingValueAction::DropHighMissingColumns).target_columns,
            vec!["notes"]
        );
        assert_eq!(
            find(&solutions, MissingValueAction::FillNumericMedian).target_columns,
            vec!["score"]
        );
        assert_eq!(
            find(&solutions, MissingValueAction::FillDatetimeFfill).target_columns,
            vec!["day"]
        );
    }

    #[test]
    fn test_no_missing_no_suggestions() {
        let frame = DataFrame::new(vec![Column::from_strs("a", &["x", "y", "x"])]).unwrap();
        let profile = DatasetProfiler::new().profile(&frame);
        assert!(MissingValueTreatment::new().suggest(&profile).is_empty());
    }

    #[test]
    fn test_smart_impute_fills_every_role() {
        let frame = gappy_frame();
        let profile = DatasetProfiler::new().profile(&frame);
        let treatment = MissingValueTreatment::new();
        let smart = find(&treatment.suggest(&profile), MissingValueAction::SmartImpute).clone();

        let (treated, result) = treatment.apply(&frame, &profile, &smart).unwrap();
        assert_eq!(treated.column("score").unwrap().missing_count(), 0);
        assert_eq!(treated.column("segment").unwrap().label(4).as_deref(), Some("a"));
        let day = treated.column("day").unwrap();
        assert_eq!(day.label(0).as_deref(), Some("2024-01-02"));
        assert_eq!(day.label(5).as_deref(), Some("2024-01-02"));
        assert_eq!(result.rows_before, result.rows_after);
        assert!(result.missing_after < result.missing_before);
        assert!(result.affected_columns.contains(&"day".to_string()));
        assert!(result.summary.starts_with("Smart Imputation (Recommended) applied."));
    }

    #[test]
    fn test_drop_high_missing_columns() {
        let frame = gappy_frame();
        let profile = DatasetProfiler::new().profile(&frame);
        let treatment = MissingValueTreatment::new();
        let drop = find(&treatment.suggest(&profile), MissingValueAction::DropHighMissingColumns).clone();

        let (treated, result) = treatment.apply(&frame, &profile, &drop).unwrap();
        assert!(!treated.has_column("notes"));
        assert_eq!(treated.column_count(), 3);
        assert_eq!(result.affected_columns, vec!["notes"]);

        let reprofiled = DatasetProfiler::new().profile(&treated);
        assert!(treatment
            .suggest(&reprofiled)
            .iter()
            .all(|s| s.action != MissingValueAction::DropHighMissingColumns));
    }
}
