//! One function per plan operation.
//!
//! Every operation reads the working frame and returns a summary plus metrics. Only
//! `clean_data` produces a new frame.

use super::context::{StepContext, TrainedModel, TrainedState};
use super::models::{
    classification_metrics, regression_metrics, train_test_split, LinearRegression,
    LogisticRegression,
};
use super::StepError;
use crate::config::ExecutionConfig;
use crate::investigation::encoding::OneHotEncoder;
use crate::investigation::infer_target_type;
use crate::stats::descriptive::{max, mean, median, min, quantile, std_dev};
use crate::stats::{pearson, round_to};
use crate::types::{parse_date, Column, ColumnData, DataFrame, Metrics, PlanStep, TargetType};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Summary text and metrics of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub summary: String,
    pub metrics: Metrics,
}

impl StepOutput {
    fn new(summary: impl Into<String>, metrics: Value) -> Self {
        let metrics = match metrics {
            Value::Object(map) => map,
            _ => Metrics::new(),
        };
        Self {
            summary: summary.into(),
            metrics,
        }
    }
}

fn required_param<'a>(step: &'a PlanStep, key: &str) -> Result<&'a str, StepError> {
    step.param_str(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StepError::MissingParameter(key.to_string()))
}

fn required_column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column, StepError> {
    frame
        .column(name)
        .ok_or_else(|| StepError::ColumnNotFound(name.to_string()))
}

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Per-column descriptive statistics.
pub fn summary(frame: &DataFrame) -> Result<StepOutput, StepError> {
    if frame.row_count() == 0 {
        return Err(StepError::EmptyDataset);
    }

    let mut columns = Metrics::new();
    for column in frame.columns() {
        let stats = match &column.data {
            ColumnData::Numeric(cells) => {
                let values = present(cells);
                json!({
                    "count": values.len(),
                    "mean": mean(&values),
                    "std": std_dev(&values),
                    "min": min(&values),
                    "25%": quantile(&values, 0.25),
                    "50%": quantile(&values, 0.5),
                    "75%": quantile(&values, 0.75),
                    "max": max(&values),
                })
            }
            ColumnData::Categorical(_) => {
                let (top, freq) = column.mode().map_or((None, None), |(t, f)| (Some(t), Some(f)));
                json!({
                    "count": column.len() - column.missing_count(),
                    "unique": column.unique_count(),
                    "top": top,
                    "freq": freq,
                })
            }
        };
        columns.insert(column.name.clone(), stats);
    }

    Ok(StepOutput::new(
        "Generated dataframe summary statistics.",
        json!({
            "rows": frame.row_count(),
            "columns": frame.column_count(),
            "summary": columns,
        }),
    ))
}

// ============================================================================
// GROUPBY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregation {
    Mean,
    Sum,
    Count,
    Min,
    Max,
    Median,
    Std,
}

impl Aggregation {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" | "average" => Self::Mean,
            "sum" => Self::Sum,
            "count" | "size" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            "median" => Self::Median,
            "std" => Self::Std,
            _ => return None,
        })
    }

    fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Mean => mean(values),
            Self::Sum => Some(values.iter().sum()),
            Self::Count => Some(values.len() as f64),
            Self::Min => min(values),
            Self::Max => max(values),
            Self::Median => median(values),
            Self::Std => std_dev(values),
        }
    }
}

/// Aggregates `target_column` per `group_by` value, sorted by value descending.
///
/// Rows with a missing group key are dropped. Groups whose aggregate is undefined sort last
/// with a null value.
pub fn groupby(
    frame: &DataFrame,
    step: &PlanStep,
    cfg: &ExecutionConfig,
) -> Result<StepOutput, StepError> {
    let group_by = required_param(step, "group_by")?;
    let target_column = required_param(step, "target_column")?;
    let group_col = required_column(frame, group_by)?;
    let target = required_column(frame, target_column)?;

    let agg_name = step.param_str("agg").unwrap_or("mean");
    let unsupported = || StepError::UnsupportedAggregation {
        agg: agg_name.to_string(),
        column: target_column.to_string(),
    };
    let agg = Aggregation::parse(agg_name).ok_or_else(unsupported)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    match target.as_numeric() {
        Some(values) => {
            for (row, value) in values.iter().enumerate() {
                let Some(key) = group_col.label(row) else { continue };
                let bucket = groups.entry(key).or_default();
                if let Some(v) = value {
                    bucket.push(*v);
                }
            }
        }
        None if agg == Aggregation::Count => {
            for row in 0..frame.row_count() {
                let Some(key) = group_col.label(row) else { continue };
                let bucket = groups.entry(key).or_default();
                if !target.is_missing(row) {
                    bucket.push(1.0);
                }
            }
        }
        None => return Err(unsupported()),
    }

    let mut rows: Vec<(String, Option<f64>)> = groups
        .into_iter()
        .map(|(key, values)| (key, agg.apply(&values)))
        .collect();
    rows.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    let total_groups = rows.len();
    rows.truncate(cfg.groupby_limit);

    let result: Vec<Value> = rows
        .into_iter()
        .map(|(group, value)| json!({ "group": group, "value": value }))
        .collect();

    Ok(StepOutput::new(
        format!("Computed {agg_name} by {group_by} for {target_column}."),
        json!({ "groupby_result": result, "group_count": total_groups }),
    ))
}

// ============================================================================
// CORRELATION
// ============================================================================

/// Pearson correlation matrix over numeric columns (pairwise complete observations) and
/// the strongest off-diagonal pair.
pub fn correlation(frame: &DataFrame) -> Result<StepOutput, StepError> {
    let numeric: Vec<(&str, &[Option<f64>])> = frame
        .columns()
        .iter()
        .filter_map(|c| c.as_numeric().map(|v| (c.name.as_str(), v)))
        .collect();
    if numeric.len() < 2 {
        return Err(StepError::InsufficientNumericColumns);
    }

    let n = numeric.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = numeric[i]
                .1
                .iter()
                .zip(numeric[j].1)
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .unzip();
            let r = pearson(&xs, &ys);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    let mut strongest: Option<(usize, usize, f64)> = None;
    for (i, row) in matrix.iter().enumerate() {
        for (j, r) in row.iter().enumerate() {
            let Some(r) = *r else { continue };
            if i == j {
                continue;
            }
            if strongest.map_or(true, |(_, _, best)| r.abs() > best.abs()) {
                strongest = Some((i, j, r));
            }
        }
    }

    let mut rendered = Metrics::new();
    for (i, (name, _)) in numeric.iter().enumerate() {
        let row: Metrics = numeric
            .iter()
            .enumerate()
            .map(|(j, (other, _))| ((*other).to_string(), json!(matrix[i][j].map(|r| round_to(r, 4)))))
            .collect();
        rendered.insert((*name).to_string(), Value::Object(row));
    }

    let (pair, value) = match strongest {
        Some((i, j, r)) => (Some(vec![numeric[i].0, numeric[j].0]), Some(r)),
        None => (None, None),
    };

    Ok(StepOutput::new(
        "Computed correlation matrix for numeric columns.",
        json!({
            "correlation_matrix": rendered,
            "strongest_pair": pair,
            "strongest_value": value,
        }),
    ))
}

// ============================================================================
// TREND
// ============================================================================

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

/// Monthly buckets keyed by month-end date.
///
/// With a numeric `target_column` each bucket holds the mean of that column and empty
/// months are omitted. Otherwise each bucket holds the row count and empty months between
/// the first and last month are reported as 0.
pub fn trend(frame: &DataFrame, step: &PlanStep) -> Result<StepOutput, StepError> {
    let datetime_column = required_param(step, "datetime_column")?;
    let dates = required_column(frame, datetime_column)?;

    let parsed: Vec<Option<NaiveDate>> = (0..frame.row_count())
        .map(|row| dates.label(row).and_then(|s| parse_date(&s)).and_then(month_end))
        .collect();
    if parsed.iter().all(Option::is_none) {
        return Err(StepError::NoParseableDates);
    }

    let numeric_target = step
        .param_str("target_column")
        .and_then(|name| frame.column(name))
        .and_then(|c| c.as_numeric().map(|v| (c.name.as_str(), v)));

    let (label, points): (String, BTreeMap<NaiveDate, f64>) = match numeric_target {
        Some((name, values)) => {
            let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
            for (month, value) in parsed.iter().zip(values) {
                if let (Some(month), Some(v)) = (month, value) {
                    buckets.entry(*month).or_default().push(*v);
                }
            }
            let means = buckets
                .into_iter()
                .filter_map(|(month, vals)| mean(&vals).map(|m| (month, m)))
                .collect();
            (format!("Monthly mean trend for {name}"), means)
        }
        None => {
            let mut counts: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for month in parsed.iter().flatten() {
                *counts.entry(*month).or_insert(0.0) += 1.0;
            }
            if let (Some(first), Some(last)) =
                (counts.keys().next().copied(), counts.keys().last().copied())
            {
                let mut cursor = first;
                while cursor < last {
                    let Some(next) = cursor.succ_opt().and_then(month_end) else { break };
                    counts.entry(next).or_insert(0.0);
                    cursor = next;
                }
            }
            ("Monthly row-count trend".to_string(), counts)
        }
    };

    let rendered: Metrics = points
        .into_iter()
        .map(|(month, v)| (month.format("%Y-%m-%d").to_string(), json!(v)))
        .collect();

    Ok(StepOutput::new(label, json!({ "trend_points": rendered })))
}

// ============================================================================
// TRAIN_MODEL / EVALUATE_MODEL
// ============================================================================

/// Fits a baseline model on every non-target column and stores the held-out predictions.
pub fn train_model(
    frame: &DataFrame,
    step: &PlanStep,
    cfg: &ExecutionConfig,
    ctx: &mut StepContext,
) -> Result<StepOutput, StepError> {
    let target_column = required_param(step, "target_column")?;
    let target = required_column(frame, target_column)?;

    let features: Vec<String> = frame
        .column_names()
        .into_iter()
        .filter(|name| name != target_column)
        .collect();
    let encoder = OneHotEncoder::fit(frame, &features, true);
    let encoded = encoder.transform(frame);

    let rows: Vec<usize> = (0..frame.row_count())
        .filter(|&r| !target.is_missing(r) && encoded[r].iter().all(|v| v.is_finite()))
        .collect();
    if rows.is_empty() {
        return Err(StepError::NoValidRows);
    }
    let x: Vec<Vec<f64>> = rows.iter().map(|&r| encoded[r].clone()).collect();
    let y_column = target.take(&rows);
    let task_type = infer_target_type(&y_column, cfg.classification_cardinality);

    let split = train_test_split(rows.len(), cfg.test_fraction, cfg.split_seed)?;
    let pick = |idx: &[usize]| -> Vec<Vec<f64>> { idx.iter().map(|&i| x[i].clone()).collect() };
    let (x_train, x_test) = (pick(&split.train), pick(&split.test));

    let (model, y_test, y_pred) = match task_type {
        TargetType::Classification => {
            let labels: Vec<String> = y_column.labels().into_iter().flatten().collect();
            let classes: Vec<&String> = labels.iter().collect::<BTreeSet<_>>().into_iter().collect();
            let codes: Vec<usize> = labels
                .iter()
                .map(|l| classes.binary_search(&l).unwrap_or(0))
                .collect();
            let y_train: Vec<usize> = split.train.iter().map(|&i| codes[i]).collect();
            let model = LogisticRegression::fit(&x_train, &y_train, classes.len(), cfg)?;
            let y_test: Vec<f64> = split.test.iter().map(|&i| codes[i] as f64).collect();
            let y_pred: Vec<f64> = x_test.iter().map(|r| model.predict(r) as f64).collect();
            (TrainedModel::Logistic(model), y_test, y_pred)
        }
        TargetType::Regression => {
            let values = present(&y_column.parse_numeric());
            if values.len() != rows.len() {
                return Err(StepError::NoValidRows);
            }
            let y_train: Vec<f64> = split.train.iter().map(|&i| values[i]).collect();
            let model = LinearRegression::fit(&x_train, &y_train)?;
            let y_test: Vec<f64> = split.test.iter().map(|&i| values[i]).collect();
            let y_pred: Vec<f64> = x_test.iter().map(|r| model.predict(r)).collect();
            (TrainedModel::Linear(model), y_test, y_pred)
        }
    };

    ctx.trained = Some(TrainedState {
        model,
        task_type,
        target_column: target_column.to_string(),
        y_test,
        y_pred,
    });

    Ok(StepOutput::new(
        format!("Trained baseline {task_type} model on target '{target_column}'."),
        json!({
            "task_type": task_type.as_str(),
            "target_column": target_column,
            "train_rows": split.train.len(),
            "test_rows": split.test.len(),
            "feature_count": encoder.width(),
        }),
    ))
}

/// Scores the held-out predictions of the last TRAIN_MODEL step.
pub fn evaluate_model(ctx: &StepContext) -> Result<StepOutput, StepError> {
    let trained = ctx.trained.as_ref().ok_or(StepError::NoTrainedModel)?;

    let metrics = match trained.task_type {
        TargetType::Classification => {
            let y_true: Vec<usize> = trained.y_test.iter().map(|v| *v as usize).collect();
            let y_pred: Vec<usize> = trained.y_pred.iter().map(|v| *v as usize).collect();
            let m = classification_metrics(&y_true, &y_pred);
            json!({
                "accuracy": m.accuracy,
                "precision_weighted": m.precision_weighted,
                "recall_weighted": m.recall_weighted,
                "f1_weighted": m.f1_weighted,
            })
        }
        TargetType::Regression => {
            let m = regression_metrics(&trained.y_test, &trained.y_pred);
            json!({ "mae": m.mae, "rmse": m.rmse, "r2": m.r2 })
        }
    };

    Ok(StepOutput::new(
        format!("Evaluated {} model performance.", trained.task_type),
        metrics,
    ))
}

// ============================================================================
// CLEAN_DATA
// ============================================================================

/// Cleaning operations, applied in declaration order whenever selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningOperation {
    DropDuplicates,
    FillNumericMedian,
    FillCategoricalMode,
    RemoveOutliersIqr,
}

impl CleaningOperation {
    pub const DEFAULT: [Self; 3] = [
        Self::DropDuplicates,
        Self::FillNumericMedian,
        Self::FillCategoricalMode,
    ];
}

impl FromStr for CleaningOperation {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "drop_duplicates" => Ok(Self::DropDuplicates),
            "fill_numeric_median" => Ok(Self::FillNumericMedian),
            "fill_categorical_mode" => Ok(Self::FillCategoricalMode),
            "remove_outliers_iqr" => Ok(Self::RemoveOutliersIqr),
            other => Err(StepError::UnknownCleaningOperation(other.to_string())),
        }
    }
}

/// Reads the `operations` parameter (defaults when absent).
pub fn cleaning_operations(step: &PlanStep) -> Result<Vec<CleaningOperation>, StepError> {
    match step.parameters.get("operations") {
        None | Some(Value::Null) => Ok(CleaningOperation::DEFAULT.to_vec()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(name) => name.parse(),
                None => Err(StepError::UnknownCleaningOperation(item.to_string())),
            })
            .collect(),
        Some(other) => Err(StepError::UnknownCleaningOperation(other.to_string())),
    }
}

/// Applies the selected operations and returns the cleaned frame with before/after counts.
pub fn clean_frame(
    frame: &DataFrame,
    operations: &[CleaningOperation],
) -> Result<(DataFrame, Metrics), StepError> {
    let selected: BTreeSet<CleaningOperation> = operations.iter().copied().collect();
    let mut metrics = Metrics::new();
    metrics.insert("rows_before".into(), json!(frame.row_count()));
    metrics.insert("missing_before".into(), json!(frame.total_missing()));

    let mut cleaned = frame.clone();
    for op in &selected {
        match op {
            CleaningOperation::DropDuplicates => {
                let (deduped, removed) = cleaned.drop_duplicates();
                cleaned = deduped;
                metrics.insert("duplicates_removed".into(), json!(removed));
            }
            CleaningOperation::FillNumericMedian => {
                for column in cleaned.columns().to_vec() {
                    let Some(values) = column.as_numeric() else { continue };
                    let Some(fill) = median(&present(values)) else { continue };
                    let filled = values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
                    cleaned.replace_column(Column::numeric(column.name.clone(), filled))?;
                }
            }
            CleaningOperation::FillCategoricalMode => {
                for column in cleaned.columns().to_vec() {
                    let ColumnData::Categorical(values) = &column.data else { continue };
                    let fill = column
                        .mode()
                        .map_or_else(|| "UNKNOWN".to_string(), |(label, _)| label);
                    let filled = values
                        .iter()
                        .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
                        .collect();
                    cleaned.replace_column(Column::categorical(column.name.clone(), filled))?;
                }
            }
            CleaningOperation::RemoveOutliersIqr => {
                for name in cleaned.numeric_column_names() {
                    let Some(values) = cleaned.column(&name).and_then(Column::as_numeric) else {
                        continue;
                    };
                    let observed = present(values);
                    let (Some(q1), Some(q3)) =
                        (quantile(&observed, 0.25), quantile(&observed, 0.75))
                    else {
                        continue;
                    };
                    let iqr = q3 - q1;
                    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
                    let keep: Vec<bool> = values
                        .iter()
                        .map(|v| v.is_some_and(|x| x >= lower && x <= upper))
                        .collect();
                    cleaned = cleaned.filter_rows(&keep);
                }
            }
        }
    }

    metrics.insert("rows_after".into(), json!(cleaned.row_count()));
    metrics.insert("missing_after".into(), json!(cleaned.total_missing()));
    Ok((cleaned, metrics))
}

/// CLEAN_DATA step: cleaned frame for the following steps plus its report.
pub fn clean_data(frame: &DataFrame, step: &PlanStep) -> Result<(StepOutput, DataFrame), StepError> {
    let operations = cleaning_operations(step)?;
    let (cleaned, metrics) = clean_frame(frame, &operations)?;
    Ok((
        StepOutput {
            summary: "Applied deterministic data cleaning operations.".to_string(),
            metrics,
        },
        cleaned,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationType;

    fn step(op: OperationType) -> PlanStep {
        PlanStep::new("s1", "test step", op)
    }

    fn sales_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::from_strs("region", &["north", "south", "north", "east", "south", "north"]),
            Column::from_f64("sales", &[10.0, 4.0, 14.0, 7.0, 6.0, 12.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_summary_reports_numeric_and_categorical() {
        let out = summary(&sales_frame()).unwrap();
        assert_eq!(out.metrics["rows"], 6);
        let sales = &out.metrics["summary"]["sales"];
        assert_eq!(sales["count"], 6);
        assert_eq!(sales["min"], 4.0);
        let region = &out.metrics["summary"]["region"];
        assert_eq!(region["top"], "north");
        assert_eq!(region["freq"], 3);
    }

    #[test]
    fn test_summary_empty_dataset_fails() {
        let frame = DataFrame::new(vec![Column::from_f64("x", &[])]).unwrap();
        assert_eq!(summary(&frame).unwrap_err(), StepError::EmptyDataset);
    }

    #[test]
    fn test_groupby_sorted_descending() {
        let s = step(OperationType::Groupby)
            .with_param("group_by", "region")
            .with_param("target_column", "sales");
        let out = groupby(&sales_frame(), &s, &ExecutionConfig::default()).unwrap();
        assert_eq!(out.summary, "Computed mean by region for sales.");
        let groups = out.metrics["groupby_result"].as_array().unwrap();
        assert_eq!(groups[0]["group"], "north");
        assert_eq!(groups[0]["value"], 12.0);
        assert_eq!(groups[2]["group"], "south");
    }

    #[test]
    fn test_groupby_missing_column() {
        let s = step(OperationType::Groupby)
            .with_param("group_by", "channel")
            .with_param("target_column", "sales");
        let err = groupby(&sales_frame(), &s, &ExecutionConfig::default()).unwrap_err();
        assert_eq!(err, StepError::ColumnNotFound("channel".into()));
    }

    #[test]
    fn test_groupby_mean_of_text_rejected() {
        let s = step(OperationType::Groupby)
            .with_param("group_by", "sales")
            .with_param("target_column", "region");
        let err = groupby(&sales_frame(), &s, &ExecutionConfig::default()).unwrap_err();
        assert!(matches!(err, StepError::UnsupportedAggregation { .. }));

        let count = s.with_param("agg", "count");
        assert!(groupby(&sales_frame(), &count, &ExecutionConfig::default()).is_ok());
    }

    #[test]
    fn test_correlation_strongest_pair() {
        let frame = DataFrame::new(vec![
            Column::from_f64("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::from_f64("b", &[2.0, 4.0, 6.0, 8.0, 10.0]),
            Column::from_f64("c", &[5.0, 3.0, 1.0, 9.0, 2.0]),
        ])
        .unwrap();
        let out = correlation(&frame).unwrap();
        assert_eq!(out.metrics["strongest_pair"], json!(["a", "b"]));
        let value = out.metrics["strongest_value"].as_f64().unwrap();
        assert!((value - 1.0).abs() < 1e-9);
        assert_eq!(out.metrics["correlation_matrix"]["a"]["a"], 1.0);
    }

    #[test]
    fn test_correlation_needs_two_numeric_columns() {
        assert_eq!(
            correlation(&sales_frame()).unwrap_err(),
            StepError::InsufficientNumericColumns
        );
    }

    #[test]
    fn test_trend_counts_fill_empty_months() {
        let frame = DataFrame::new(vec![Column::from_strs(
            "date",
            &["2024-01-05", "2024-01-20", "2024-03-02", "garbage"],
        )])
        .unwrap();
        let s = step(OperationType::Trend).with_param("datetime_column", "date");
        let out = trend(&frame, &s).unwrap();
        assert_eq!(out.summary, "Monthly row-count trend");
        let points = out.metrics["trend_points"].as_object().unwrap();
        assert_eq!(points["2024-01-31"], 2.0);
        assert_eq!(points["2024-02-29"], 0.0);
        assert_eq!(points["2024-03-31"], 1.0);
    }

    #[test]
    fn test_trend_mean_of_target() {
        let frame = DataFrame::new(vec![
            Column::from_strs("date", &["2024-01-05", "2024-01-20", "2024-03-02"]),
            Column::from_f64("sales", &[10.0, 20.0, 5.0]),
        ])
        .unwrap();
        let s = step(OperationType::Trend)
            .with_param("datetime_column", "date")
            .with_param("target_column", "sales");
        let out = trend(&frame, &s).unwrap();
        assert_eq!(out.summary, "Monthly mean trend for sales");
        let points = out.metrics["trend_points"].as_object().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points["2024-01-31"], 15.0);
    }

    #[test]
    fn test_trend_without_dates_fails() {
        let frame = DataFrame::new(vec![Column::from_strs("date", &["x", "y"])]).unwrap();
        let s = step(OperationType::Trend).with_param("datetime_column", "date");
        assert_eq!(trend(&frame, &s).unwrap_err(), StepError::NoParseableDates);
    }

    #[test]
    fn test_train_then_evaluate_regression() {
        let x: Vec<f64> = (0..30i32).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 * v + 2.0).collect();
        let frame = DataFrame::new(vec![Column::from_f64("x", &x), Column::from_f64("y", &y)]).unwrap();
        let s = step(OperationType::TrainModel).with_param("target_column", "y");

        let mut ctx = StepContext::new();
        let out = train_model(&frame, &s, &ExecutionConfig::default(), &mut ctx).unwrap();
        assert_eq!(out.metrics["task_type"], "regression");
        assert_eq!(out.metrics["test_rows"], 6);
        assert_eq!(out.metrics["train_rows"], 24);

        let eval = evaluate_model(&ctx).unwrap();
        assert!(eval.metrics["mae"].as_f64().unwrap() < 1e-6);
        assert!((eval.metrics["r2"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_train_classification_with_categorical_feature() {
        let plan: Vec<&str> = (0..40).map(|i| if i % 2 == 0 { "basic" } else { "pro" }).collect();
        let churn: Vec<&str> = (0..40).map(|i| if i % 2 == 0 { "yes" } else { "no" }).collect();
        let frame = DataFrame::new(vec![
            Column::from_strs("plan", &plan),
            Column::from_strs("churn", &churn),
        ])
        .unwrap();
        let s = step(OperationType::TrainModel).with_param("target_column", "churn");
        let mut ctx = StepContext::new();
        let out = train_model(&frame, &s, &ExecutionConfig::default(), &mut ctx).unwrap();
        assert_eq!(out.metrics["task_type"], "classification");
        assert_eq!(out.metrics["feature_count"], 1);
        let eval = evaluate_model(&ctx).unwrap();
        assert_eq!(eval.metrics["accuracy"], 1.0);
    }

    #[test]
    fn test_evaluate_without_model_fails() {
        assert_eq!(
            evaluate_model(&StepContext::new()).unwrap_err(),
            StepError::NoTrainedModel
        );
    }

    #[test]
    fn test_clean_data_default_operations() {
        let frame = DataFrame::new(vec![
            Column::numeric("x", vec![Some(1.0), Some(1.0), None, Some(5.0)]),
            Column::categorical(
                "c",
                vec![Some("a".into()), Some("a".into()), None, Some("b".into())],
            ),
        ])
        .unwrap();
        let (out, cleaned) = clean_data(&frame, &step(OperationType::CleanData)).unwrap();
        assert_eq!(out.metrics["rows_before"], 4);
        assert_eq!(out.metrics["missing_before"], 2);
        assert_eq!(out.metrics["duplicates_removed"], 1);
        assert_eq!(out.metrics["rows_after"], 3);
        assert_eq!(out.metrics["missing_after"], 0);
        assert_eq!(cleaned.column("c").unwrap().label(1), Some("a".into()));
        assert_eq!(cleaned.column("x").unwrap().label(1), Some("3".into()));
    }

    #[test]
    fn test_clean_data_outliers_and_unknown_operation() {
        let frame = DataFrame::new(vec![Column::from_f64(
            "x",
            &[1.0, 2.0, 2.0, 3.0, 2.0, 100.0],
        )])
        .unwrap();
        let s = step(OperationType::CleanData).with_param("operations", json!(["remove_outliers_iqr"]));
        let (out, cleaned) = clean_data(&frame, &s).unwrap();
        assert_eq!(cleaned.row_count(), 5);
        assert!(out.metrics.get("duplicates_removed").is_none());

        let bad = step(OperationType::CleanData).with_param("operations", json!(["scrub"]));
        assert_eq!(
            clean_data(&frame, &bad).unwrap_err(),
            StepError::UnknownCleaningOperation("scrub".into())
        );
    }
}
