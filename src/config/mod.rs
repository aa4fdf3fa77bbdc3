//! Studio Configuration Module
//!
//! Tunable thresholds for the analysis core, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `STUDIO_CONFIG` environment variable (path to TOML file)
//! 2. `studio_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(StudioConfig::load());
//!
//! // Anywhere in the codebase:
//! let trees = config::get().importance.n_trees;
//! ```

mod studio_config;
pub mod validation;

pub use studio_config::*;

use std::sync::OnceLock;

static STUDIO_CONFIG: OnceLock<StudioConfig> = OnceLock::new();
static DEFAULT_CONFIG: OnceLock<StudioConfig> = OnceLock::new();

/// Initialize the global studio configuration. Later calls are ignored.
pub fn init(config: StudioConfig) {
    if STUDIO_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Global studio configuration, or built-in defaults when `init()` was never called.
pub fn get() -> &'static StudioConfig {
    STUDIO_CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT_CONFIG.get_or_init(StudioConfig::default))
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    STUDIO_CONFIG.get().is_some()
}
