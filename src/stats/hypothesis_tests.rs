//! Hypothesis tests: Mann-Whitney U, one-way ANOVA, chi-square test of independence.
//!
//! Each test returns `None` for degenerate input (empty groups, zero variance, empty
//! expected cells) so callers can skip the feature without treating it as an error.

use super::descriptive::{average_ranks, mean, sum_of_squares, tie_group_sizes};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};
use std::collections::BTreeMap;

/// Test statistic with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    fn checked(statistic: f64, p_value: f64) -> Option<Self> {
        (statistic.is_finite() && p_value.is_finite()).then(|| Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        })
    }
}

/// Two-sided Mann-Whitney U test, normal approximation with tie and continuity correction.
///
/// The reported statistic is U for `sample_a`.
pub fn mann_whitney_u(sample_a: &[f64], sample_b: &[f64]) -> Option<TestOutcome> {
    let (n1, n2) = (sample_a.len(), sample_b.len());
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let pooled: Vec<f64> = sample_a.iter().chain(sample_b).copied().collect();
    let ranks = average_ranks(&pooled);
    let rank_sum_a: f64 = ranks[..n1].iter().sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let u1 = rank_sum_a - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;

    let tie_term: f64 = tie_group_sizes(&pooled)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let sigma = (n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if !(sigma > 0.0) {
        return None;
    }

    let mu = n1f * n2f / 2.0;
    let z = (u1.max(u2) - mu - 0.5) / sigma;
    let normal = Normal::new(0.0, 1.0).ok()?;
    let p = 2.0 * (1.0 - normal.cdf(z));
    TestOutcome::checked(u1, p)
}

/// One-way ANOVA F-test across groups.
///
/// `None` with fewer than 2 non-empty groups, no within-group degrees of freedom, or zero
/// within-group variance.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<TestOutcome> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || total <= k {
        return None;
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean = mean(&all)?;
    let ss_between: f64 = groups
        .iter()
        .filter_map(|g| mean(g).map(|m| g.len() as f64 * (m - grand_mean).powi(2)))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();
    if ss_within <= 0.0 {
        return None;
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let f_stat = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).ok()?;
    TestOutcome::checked(f_stat, 1.0 - dist.cdf(f_stat))
}

/// Observed frequency table of two label sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Cross-tabulates paired labels. Rows follow `rows`, columns follow `cols`, both sorted.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
        let mut row_set = std::collections::BTreeSet::new();
        let mut col_set = std::collections::BTreeSet::new();
        for (r, c) in pairs {
            *cells.entry((r, c)).or_insert(0.0) += 1.0;
            row_set.insert(r);
            col_set.insert(c);
        }

        let row_labels: Vec<String> = row_set.iter().map(|s| (*s).to_string()).collect();
        let col_labels: Vec<String> = col_set.iter().map(|s| (*s).to_string()).collect();
        let counts = row_set
            .iter()
            .map(|r| {
                col_set
                    .iter()
                    .map(|c| cells.get(&(*r, *c)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Self {
            row_labels,
            col_labels,
            counts,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.col_labels.len())
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }
}

/// Chi-square test of independence.
///
/// With one degree of freedom Yates' continuity correction is applied. A table with a
/// single row or column yields statistic 0 and p = 1.
pub fn chi_square_independence(table: &ContingencyTable) -> Option<TestOutcome> {
    let (rows, cols) = table.shape();
    let n = table.total();
    if rows == 0 || cols == 0 || n <= 0.0 {
        return None;
    }

    let row_totals: Vec<f64> = table.counts.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|c| table.counts.iter().map(|r| r[c]).sum())
        .collect();

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Some(TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
        });
    }

    let mut chi2 = 0.0;
    for (r, row) in table.counts.iter().enumerate() {
        for (c, &observed) in row.iter().enumerate() {
            let expected = row_totals[r] * col_totals[c] / n;
            if expected <= 0.0 {
                return None;
            }
            let mut diff = (observed - expected).abs();
            if dof == 1 {
                diff = (diff - 0.5).max(0.0);
            }
            chi2 += diff * diff / expected;
        }
    }

    let dist = ChiSquared::new(dof as f64).ok()?;
    TestOutcome::checked(chi2, 1.0 - dist.cdf(chi2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mann_whitney_separated_groups() {
        let a: Vec<f64> = (0..30).map(|i| 10.0 + (i % 5) as f64 * 0.1).collect();
        let b: Vec<f64> = (0..30).map(|i| 20.0 + (i % 5) as f64 * 0.1).collect();
        let out = mann_whitney_u(&a, &b).unwrap();
        assert!(out.p_value < 1e-6);
        assert_eq!(out.statistic, 0.0);
    }

    #[test]
    fn test_mann_whitney_identical_constant_is_none() {
        assert!(mann_whitney_u(&[1.0, 1.0, 1.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_anova_detects_difference() {
        let groups = vec![
            vec![1.0, 2.0, 1.5, 1.2],
            vec![5.0, 5.5, 6.0, 5.2],
            vec![9.0, 9.5, 8.7, 9.1],
        ];
        let out = one_way_anova(&groups).unwrap();
        assert!(out.statistic > 10.0);
        assert!(out.p_value < 0.001);
    }

    #[test]
    fn test_anova_zero_within_variance_is_none() {
        let groups = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert!(one_way_anova(&groups).is_none());
    }

    #[test]
    fn test_contingency_and_chi_square() {
        let pairs: Vec<(&str, &str)> = std::iter::repeat(("a", "yes"))
            .take(40)
            .chain(std::iter::repeat(("b", "no")).take(40))
            .chain(std::iter::repeat(("a", "no")).take(5))
            .chain(std::iter::repeat(("b", "yes")).take(5))
            .collect();
        let table = ContingencyTable::from_pairs(pairs);
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.total(), 90.0);
        let out = chi_square_independence(&table).unwrap();
        assert!(out.p_value < 0.001);
    }

    #[test]
    fn test_chi_square_single_column() {
        let table = ContingencyTable::from_pairs(vec![("a", "x"), ("b", "x")]);
        let out = chi_square_independence(&table).unwrap();
        assert_eq!(out.statistic, 0.0);
        assert_eq!(out.p_value, 1.0);
    }
}
