//! raindrop-sync: turns favourited Raindrop.io bookmarks into tasks, once each.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod logging;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
