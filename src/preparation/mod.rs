//! Data preparation between profiling and the first question.
//!
//! ## Architecture
//! - `domain`: `DomainClassifier` boundary; `RoleDomainClassifier` labels the dataset from its
//!   column roles
//! - `summary`: `DatasetSummarizer` boundary; `ProfileSummarizer` builds the narrative overview
//!   and `dataset_opening` the lead-in message
//! - `missing`: missing-value solutions suggested per profile and applied to the frame
//!
//! The classifier and summarizer are async traits so model-backed implementations can
//! replace the deterministic defaults.

pub mod domain;
pub mod missing;
pub mod summary;

pub use domain::{DomainClassifier, RoleDomainClassifier};
pub use missing::MissingValueTreatment;
pub use summary::{dataset_opening, DatasetSummarizer, ProfileSummarizer};
