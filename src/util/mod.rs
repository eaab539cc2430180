//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_count, format_duration_ms};
pub use time::format_relative_time;
