//! Pearson and Spearman correlation.
//!
//! P-values use Student's t-distribution from statrs:
//! t = r × sqrt(n-2) / sqrt(1-r²), two-tailed with n-2 degrees of freedom.

use super::descriptive::{average_ranks, mean};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pearson correlation coefficient.
///
/// `None` when the slices differ in length, hold fewer than 2 points, or either side has
/// zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut cov = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        sx += dx * dx;
        sy += dy * dy;
    }

    if sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let r = cov / (sx.sqrt() * sy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Two-tailed p-value for a Pearson r over `n` pairs.
pub fn pearson_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 || !r.is_finite() {
        return None;
    }
    if r.abs() >= 1.0 {
        return Some(0.0);
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();
    let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - t_dist.cdf(t_stat.abs()));
    p.is_finite().then(|| p.clamp(0.0, 1.0))
}

/// Pearson r with its p-value.
pub fn pearson_test(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let r = pearson(x, y)?;
    let p = pearson_p_value(r, x.len())?;
    Some((r, p))
}

/// Spearman rank correlation (Pearson over average ranks).
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_linear() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        let (_, p) = pearson_test(&x, &y).unwrap();
        assert!(p < 1e-6);
    }

    #[test]
    fn test_zero_variance_is_none() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_spearman_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 100.0];
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_p_value_weak_correlation_is_large() {
        let p = pearson_p_value(0.05, 20).unwrap();
        assert!(p > 0.5);
    }
}
