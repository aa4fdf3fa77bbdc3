//! Statistical primitives used by the investigation path and the plan engine.
//!
//! - `descriptive`: mean, variance, quantiles, ranks
//! - `correlation`: Pearson (with statrs t-test p-values) and Spearman
//! - `hypothesis_tests`: Mann-Whitney U, one-way ANOVA, chi-square independence
//! - `effect_size`: Cohen's d, eta-squared, Cramér's V

pub mod correlation;
pub mod descriptive;
pub mod effect_size;
pub mod hypothesis_tests;

pub use correlation::{pearson, pearson_test, spearman};
pub use descriptive::round_to;
pub use effect_size::{cohens_d, cramers_v, eta_squared};
pub use hypothesis_tests::{
    chi_square_independence, mann_whitney_u, one_way_anova, ContingencyTable, TestOutcome,
};
