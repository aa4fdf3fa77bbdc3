//! Goal-driven driver discovery.
//!
//! ## Architecture
//! - `selector`: picks and runs the statistical test for one feature/target pair
//! - `forest`: CART random forest used for impurity importances
//! - `encoding`: one-hot encoding of mixed-type columns
//! - `importance`: fits the forest and folds encoded importances onto source features
//! - `ranking`: combines test outputs into normalized, ranked driver scores
//! - `hypotheses`: hypothesis generation boundary (profile-driven default)
//! - `synthesis`: natural-language answer boundary (template default)
//! - `target`: target typing and candidate suggestion
//! - `engine`: runs the stages in order for one target

pub mod encoding;
pub mod engine;
pub mod forest;
pub mod hypotheses;
pub mod importance;
pub mod ranking;
pub mod selector;
pub mod synthesis;
pub mod target;

pub use engine::{InvestigationEngine, InvestigationReport};
pub use hypotheses::{HypothesisGenerator, ProfileHypothesisGenerator};
pub use importance::{ImportanceAggregator, ImportanceOutcome};
pub use ranking::DriverRankingEngine;
pub use selector::{confidence_score, TestSelector};
pub use synthesis::{InsightSynthesizer, TemplateSynthesizer};
pub use target::{infer_target_type, suggest_target_candidates};
