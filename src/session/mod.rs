//! Session lifecycle.
//!
//! ## Architecture
//! - `phase`: phase enum, forward transition table and rewind rules
//! - `state`: the per-session record and its conversation log
//! - `store`: keyed session storage (in-memory default)
//! - `workflow`: `Studio`, which drives sessions through profiling, investigation and plans

pub mod phase;
pub mod state;
pub mod store;
pub mod workflow;

pub use phase::{Phase, PhaseError};
pub use state::{ConversationMessage, Role, SessionState};
pub use store::{InMemorySessionStore, SessionStore};
pub use workflow::Studio;
