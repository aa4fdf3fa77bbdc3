//! Column-major tabular frame shared by every analysis stage.
//!
//! A frame holds named columns of one of two storage kinds:
//! - `Numeric`: `f64` cells (NaN is normalized to missing on construction)
//! - `Categorical`: string cells (booleans, dates and free text land here)
//!
//! Missing cells are `None` in both kinds. Rows are addressed by position and every
//! column of a frame has the same length.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Tokens treated as missing when building a frame from raw strings.
const MISSING_TOKENS: [&str; 6] = ["", "na", "n/a", "nan", "null", "none"];

/// Errors raised while assembling a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("row {row} has {actual} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Cell storage for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

/// Borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Numeric column; non-finite values become missing.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Numeric column without missing cells.
    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::numeric(name, values.iter().copied().map(Some).collect())
    }

    /// Categorical column.
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Categorical column from string slices without missing cells.
    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::categorical(name, values.iter().map(|s| Some((*s).to_string())).collect())
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn is_missing(&self, row: usize) -> bool {
        matches!(self.cell(row), CellValue::Missing)
    }

    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    pub fn cell(&self, row: usize) -> CellValue<'_> {
        match &self.data {
            ColumnData::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => CellValue::Number(x),
                None => CellValue::Missing,
            },
            ColumnData::Categorical(v) => match v.get(row).and_then(|c| c.as_deref()) {
                Some(s) => CellValue::Text(s),
                None => CellValue::Missing,
            },
        }
    }

    /// Numeric cells when this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Cells coerced to numbers; unparseable text becomes missing.
    pub fn parse_numeric(&self) -> Vec<Option<f64>> {
        match &self.data {
            ColumnData::Numeric(v) => v.clone(),
            ColumnData::Categorical(v) => v
                .iter()
                .map(|c| {
                    c.as_deref()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|x| x.is_finite())
                })
                .collect(),
        }
    }

    /// Cells rendered as category labels (numbers use their shortest form).
    pub fn labels(&self) -> Vec<Option<String>> {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().map(|c| c.map(format_number)).collect(),
            ColumnData::Categorical(v) => v.clone(),
        }
    }

    /// Label of a single cell.
    pub fn label(&self, row: usize) -> Option<String> {
        match self.cell(row) {
            CellValue::Missing => None,
            CellValue::Number(x) => Some(format_number(x)),
            CellValue::Text(s) => Some(s.to_string()),
        }
    }

    /// Number of distinct non-missing values.
    pub fn unique_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v
                .iter()
                .flatten()
                .map(|x| normalized_bits(*x))
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Categorical(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }

    /// Occurrence count per label, sorted by label.
    pub fn value_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels().into_iter().flatten() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Most frequent label; ties resolve to the smallest label.
    pub fn mode(&self) -> Option<(String, usize)> {
        self.value_counts()
            .into_iter()
            .fold(None, |best: Option<(String, usize)>, (label, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
    }

    /// New column holding the given rows in order.
    pub fn take(&self, rows: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
        };
        Self {
            name: self.name.clone(),
            data,
        }
    }

    fn cell_key(&self, row: usize, key: &mut String) {
        match self.cell(row) {
            CellValue::Missing => key.push('\u{0}'),
            CellValue::Number(x) => {
                key.push('n');
                key.push_str(&normalized_bits(x).to_string());
            }
            CellValue::Text(s) => {
                key.push('s');
                key.push_str(s);
            }
        }
        key.push('\u{1f}');
    }
}

/// Formats a number the way a category label should read (`3` rather than `3.0`).
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{x:.0}")
    } else {
        format!("{x}")
    }
}

fn normalized_bits(x: f64) -> u64 {
    // -0.0 and 0.0 are the same value
    if x == 0.0 {
        0.0_f64.to_bits()
    } else {
        x.to_bits()
    }
}

/// Returns true when a raw string cell should be read as missing.
pub fn is_missing_token(raw: &str) -> bool {
    let trimmed = raw.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&trimmed.as_str())
}

/// Date formats accepted for datetime columns, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parses a calendar date, ignoring any time-of-day part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.date());
    }
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// In-memory tabular dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Builds a frame, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(FrameError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != row_count {
                return Err(FrameError::LengthMismatch {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Builds a frame from string records, inferring numeric columns.
    ///
    /// A column is numeric when every non-missing cell parses as a finite `f64`.
    pub fn from_records(headers: &[String], rows: &[Vec<String>]) -> Result<Self, FrameError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(FrameError::RaggedRow {
                    row: i,
                    expected: headers.len(),
                    actual: row.len(),
                });
            }
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let raw: Vec<Option<&str>> = rows
                    .iter()
                    .map(|row| {
                        let cell = row[c].as_str();
                        (!is_missing_token(cell)).then_some(cell.trim())
                    })
                    .collect();
                let parsed: Vec<Option<f64>> = raw
                    .iter()
                    .map(|cell| cell.and_then(|s| s.parse::<f64>().ok()).filter(|x| x.is_finite()))
                    .collect();
                let all_numeric = raw
                    .iter()
                    .zip(&parsed)
                    .all(|(r, p)| r.is_none() || p.is_some());
                let any_value = raw.iter().any(Option::is_some);
                if all_numeric && any_value {
                    Column::numeric(name.clone(), parsed)
                } else {
                    Column::categorical(
                        name.clone(),
                        raw.into_iter().map(|c| c.map(str::to_string)).collect(),
                    )
                }
            })
            .collect();

        Self::new(columns)
    }

    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to analyze (no rows or no columns).
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn categorical_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Total missing cells across the frame.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Keeps rows whose mask entry is `true`.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, k)| k.then_some(i))
            .collect();
        self.take_rows(&rows)
    }

    /// New frame holding the given rows in order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// Mask of rows that repeat an earlier row exactly.
    pub fn duplicated(&self) -> Vec<bool> {
        let mut seen = HashSet::with_capacity(self.row_count);
        (0..self.row_count)
            .map(|row| {
                let mut key = String::new();
                for column in &self.columns {
                    column.cell_key(row, &mut key);
                }
                !seen.insert(key)
            })
            .collect()
    }

    pub fn duplicate_row_count(&self) -> usize {
        self.duplicated().into_iter().filter(|d| *d).count()
    }

    /// Frame without repeated rows (first occurrence kept) and the number removed.
    pub fn drop_duplicates(&self) -> (Self, usize) {
        let dup = self.duplicated();
        let removed = dup.iter().filter(|d| **d).count();
        let keep: Vec<bool> = dup.into_iter().map(|d| !d).collect();
        (self.filter_rows(&keep), removed)
    }

    /// Replaces the column with the same name.
    pub fn replace_column(&mut self, column: Column) -> Result<(), FrameError> {
        let actual = column.len();
        if actual != self.row_count {
            return Err(FrameError::LengthMismatch {
                column: column.name,
                expected: self.row_count,
                actual,
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Frame restricted to the named columns, in the given order. Unknown names are skipped.
    pub fn select(&self, names: &[String]) -> Self {
        Self {
            columns: names
                .iter()
                .filter_map(|n| self.column(n).cloned())
                .collect(),
            row_count: self.row_count,
        }
    }
}
