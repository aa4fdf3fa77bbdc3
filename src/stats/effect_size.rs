//! Effect sizes: Cohen's d, eta-squared, Cramér's V.

use super::descriptive::{mean, sum_of_squares, variance};

/// Cohen's d = (mean_a - mean_b) / pooled_std.
///
/// Pooled std uses sample variances (ddof = 1). Returns 0 when the pooled std is 0 and
/// `None` when either group has fewer than 2 values.
pub fn cohens_d(group_a: &[f64], group_b: &[f64]) -> Option<f64> {
    let (na, nb) = (group_a.len(), group_b.len());
    if na < 2 || nb < 2 {
        return None;
    }
    let va = variance(group_a)?;
    let vb = variance(group_b)?;
    let pooled_var = ((na - 1) as f64 * va + (nb - 1) as f64 * vb) / (na + nb - 2) as f64;
    let pooled_std = pooled_var.sqrt();
    if pooled_std == 0.0 || !pooled_std.is_finite() {
        return Some(0.0);
    }
    Some((mean(group_a)? - mean(group_b)?) / pooled_std)
}

/// Eta-squared: between-group sum of squares over total sum of squares. In [0, 1].
pub fn eta_squared(groups: &[Vec<f64>]) -> f64 {
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let Some(grand_mean) = mean(&all) else {
        return 0.0;
    };
    let ss_total = sum_of_squares(&all);
    if ss_total <= 0.0 {
        return 0.0;
    }
    let ss_between: f64 = groups
        .iter()
        .filter_map(|g| mean(g).map(|m| g.len() as f64 * (m - grand_mean).powi(2)))
        .sum();
    (ss_between / ss_total).clamp(0.0, 1.0)
}

/// Cramér's V = sqrt((chi2 / n) / (min(rows, cols) - 1)). In [0, 1].
pub fn cramers_v(chi2: f64, n: usize, rows: usize, cols: usize) -> f64 {
    let min_dim = rows.min(cols).saturating_sub(1);
    if n == 0 || min_dim == 0 || !chi2.is_finite() {
        return 0.0;
    }
    ((chi2 / n as f64) / min_dim as f64).sqrt().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohens_d_sign_follows_means() {
        let a = [10.0, 11.0, 12.0];
        let b = [1.0, 2.0, 3.0];
        assert!(cohens_d(&a, &b).unwrap() > 0.0);
        assert!(cohens_d(&b, &a).unwrap() < 0.0);
    }

    #[test]
    fn test_cohens_d_zero_pooled_std() {
        assert_eq!(cohens_d(&[5.0, 5.0], &[5.0, 5.0]), Some(0.0));
        assert_eq!(cohens_d(&[1.0], &[2.0, 3.0]), None);
    }

    #[test]
    fn test_eta_squared_bounds() {
        let separated = vec![vec![1.0, 1.0, 1.0], vec![9.0, 9.0, 9.0]];
        assert!((eta_squared(&separated) - 1.0).abs() < 1e-12);
        let constant = vec![vec![2.0, 2.0], vec![2.0, 2.0]];
        assert_eq!(eta_squared(&constant), 0.0);
    }

    #[test]
    fn test_cramers_v_degenerate() {
        assert_eq!(cramers_v(10.0, 0, 2, 2), 0.0);
        assert_eq!(cramers_v(10.0, 100, 1, 3), 0.0);
        let v = cramers_v(100.0, 100, 2, 2);
        assert!((v - 1.0).abs() < 1e-12);
    }
}
