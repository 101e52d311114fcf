//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, login screen and modal overlays
//! - `input`: keyboard event handling
//! - `styles`: colour palette and text styling
//! - `tabs`: per-role dashboard panels

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
