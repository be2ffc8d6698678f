//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - The questionnaire with bounded numeric and single-choice controls
//! - The prediction result view

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
