//! Test module for chipdeck-core
//!
//! This module contains tests for:
//! - Inline icon markup scanning
//! - The shared LRU result cache
//! - Per-field template subscriptions
//! - Chip lifecycle (mount, unmount, config changes, rendering)
//! - Configuration loading and defaults

mod config_tests;
