//! Shared data structures for the driver-discovery pipeline
//!
//! - `dataset`: column-major DataFrame the analysis stages read
//! - `profile`: DatasetProfile and column roles
//! - `investigation`: hypotheses, statistical results, driver scores, final answers
//! - `plan`: intents, analysis plans and execution results
//! - `preparation`: domain classification, dataset summary, missing-value treatment

mod dataset;
mod investigation;
mod plan;
mod preparation;
mod profile;

pub use dataset::*;
pub use investigation::*;
pub use plan::*;
pub use preparation::*;
pub use profile::*;
