//! Infrastructure layer providing external service integrations.
//!
//! Configuration, credential checking and record storage live here; the
//! workflow only sees them through the types re-exported below.

pub mod config;
pub mod credentials;
pub mod gateway;
pub mod persistence;

pub use config::*;
pub use credentials::*;
pub use gateway::*;
pub use persistence::*;
