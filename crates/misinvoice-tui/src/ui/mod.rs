//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title bar, drawer, status bar, overlays
//! - `pages`: page bodies (forms, dashboard, access denied, listings)
//! - `input`: keyboard handling
//! - `styles`: colors and text styles

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
