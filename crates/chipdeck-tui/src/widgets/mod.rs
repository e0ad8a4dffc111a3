//! TUI widgets for chipdeck.
//!
//! - [`render_chip_view`] - Render a resolved chip as one line
//! - [`render_badge`] - Render a chip badge
//! - [`render_segments`] - Render scanned text with inline icons
//!
//! # Utilities
//!
//! - [`icon_to_str`] - Icon name to display string
//! - [`parse_color`] - Dashboard color to terminal color

mod badge;
mod chip;
mod color;
mod icon;

pub use badge::render_badge;
pub use chip::{max_width_cells, render_chip_view, render_segments};
pub use color::parse_color;
pub use icon::icon_to_str;
