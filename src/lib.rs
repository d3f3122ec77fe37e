//! Sigma Search - missing person reporting in the terminal.
//!
//! An operator logs in, fills a report form, confirms it and runs a
//! (simulated) search whose outcome is shown on a results screen. Submitted
//! reports are stored through [`infrastructure::RecordGateway`].

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
