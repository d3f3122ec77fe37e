//! Domain layer: the report record, input masks, validation and search.

pub mod errors;
pub mod formatters;
pub mod models;
pub mod search;
pub mod validator;

pub use errors::*;
pub use formatters::*;
pub use models::*;
pub use search::*;
pub use validator::*;
