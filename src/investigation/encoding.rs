//! One-hot encoding of mixed-type feature columns into a dense `f64` matrix.
//!
//! Numeric columns pass through under their own name. Categorical column `F` expands to one
//! indicator column `F_<category>` per category seen during `fit`, in sorted order. With
//! `drop_first` the first category of each column is omitted.

use crate::types::{CellValue, Column, DataFrame};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
enum EncodedSource {
    Numeric { column: String },
    Categorical { column: String, categories: Vec<String> },
}

/// Fitted encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    sources: Vec<EncodedSource>,
    drop_first: bool,
}

impl OneHotEncoder {
    /// Learns the category sets of the named columns. Unknown column names are skipped.
    pub fn fit(frame: &DataFrame, columns: &[String], drop_first: bool) -> Self {
        let sources = columns
            .iter()
            .filter_map(|name| frame.column(name))
            .map(|col| Self::source_for(col, drop_first))
            .collect();
        Self {
            sources,
            drop_first,
        }
    }

    fn source_for(col: &Column, drop_first: bool) -> EncodedSource {
        if col.is_numeric() {
            return EncodedSource::Numeric {
                column: col.name.clone(),
            };
        }
        let mut categories: Vec<String> = col
            .labels()
            .into_iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if drop_first && !categories.is_empty() {
            categories.remove(0);
        }
        EncodedSource::Categorical {
            column: col.name.clone(),
            categories,
        }
    }

    pub const fn drops_first(&self) -> bool {
        self.drop_first
    }

    /// Names of the encoded columns, in matrix order.
    pub fn encoded_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .flat_map(|s| match s {
                EncodedSource::Numeric { column } => vec![column.clone()],
                EncodedSource::Categorical { column, categories } => categories
                    .iter()
                    .map(|c| format!("{column}_{c}"))
                    .collect(),
            })
            .collect()
    }

    pub fn width(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s {
                EncodedSource::Numeric { .. } => 1,
                EncodedSource::Categorical { categories, .. } => categories.len(),
            })
            .sum()
    }

    /// Encodes every row of `frame` (row-major).
    ///
    /// Missing numeric cells become NaN. A missing or unseen category encodes as all zeros.
    /// Columns absent from `frame` encode as NaN / zeros.
    pub fn transform(&self, frame: &DataFrame) -> Vec<Vec<f64>> {
        let width = self.width();
        let mut rows = vec![Vec::with_capacity(width); frame.row_count()];

        for source in &self.sources {
            match source {
                EncodedSource::Numeric { column } => {
                    let values = frame.column(column).map(Column::parse_numeric);
                    for (r, row) in rows.iter_mut().enumerate() {
                        let v = values
                            .as_ref()
                            .and_then(|vals| vals[r])
                            .unwrap_or(f64::NAN);
                        row.push(v);
                    }
                }
                EncodedSource::Categorical { column, categories } => {
                    let col = frame.column(column);
                    for (r, row) in rows.iter_mut().enumerate() {
                        let label = col.and_then(|c| c.label(r));
                        for category in categories {
                            let hit = label.as_deref() == Some(category.as_str());
                            row.push(if hit { 1.0 } else { 0.0 });
                        }
                    }
                }
            }
        }
        rows
    }
}

/// True when an encoded column name belongs to `feature`: exact match or the
/// `feature_` category prefix.
pub fn encoded_belongs_to(encoded: &str, feature: &str) -> bool {
    encoded == feature
        || encoded
            .strip_prefix(feature)
            .is_some_and(|rest| rest.starts_with('_'))
}

/// True when any cell of the row is missing in the given columns.
pub fn row_has_missing(frame: &DataFrame, columns: &[String], row: usize) -> bool {
    columns.iter().any(|name| {
        frame
            .column(name)
            .map_or(true, |c| matches!(c.cell(row), CellValue::Missing))
    })
}
