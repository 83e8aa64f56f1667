// Shared type definitions.
// Wire types from the bookmark API, persisted tracking types, configuration and errors.

pub mod config;
pub mod errors;
pub mod raindrop;
pub mod tracked;
