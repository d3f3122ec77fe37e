//! Presentation layer: ratatui rendering of each screen and the crossterm key
//! handler.

pub mod input;
pub mod ui;

pub use input::*;
pub use ui::*;
