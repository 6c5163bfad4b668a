//! UI Module - terminal output for registry events
//!
//! ```text
//! Registry ──Logger──▶ TerminalLogger ──UiEvent──▶ UiActor (owns stdout)
//! ```
//!
//! - [`output`] - the [`Logger`](tarn_core::Logger) implementation commands hand to the registry
//! - [`actor`] - message-passing event loop that renders lines and the final summary

pub mod actor;
pub mod output;

pub use actor::{UiActor, UiEvent};
pub use output::TerminalLogger;
