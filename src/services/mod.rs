// raindrop-sync services
// Services provide behaviour: configuration, credentials, fetching, diffing and the sync pass.

pub mod config_engine;
pub mod raindrop_client;
pub mod raindrop_processor;
pub mod sync_runner;
pub mod token_provider;
