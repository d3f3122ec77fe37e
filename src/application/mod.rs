//! Application layer: the report workflow state machine and the terminal
//! state built on top of it.

pub mod state;
pub mod workflow;

pub use state::*;
pub use workflow::*;
