//! Terminal rendering for chipdeck chips.
//!
//! The `chipdeck` binary in this crate is a host: it owns the chips, feeds
//! them configuration and a backend, and draws their [`ChipView`]s with the
//! widgets below.
//!
//! [`ChipView`]: chipdeck_core::ChipView

pub mod colors;
pub mod widgets;
