//! Utility functions for string formatting.

pub mod format;

pub use format::{format_minutes, mask, truncate_string};
