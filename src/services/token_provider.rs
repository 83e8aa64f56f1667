//! Access-token sources for the Raindrop API.
//!
//! Obtaining and refreshing OAuth tokens happens elsewhere; this module only
//! hands the current token to the transport on each request.

use std::env;

use crate::types::config::ApiConfig;
use crate::types::errors::ConfigError;

/// Trait defining where the bearer token comes from.
pub trait TokenProvider {
    fn current_access_token(&self) -> Result<String, ConfigError>;
}

/// A fixed token, typically from the config file.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn current_access_token(&self) -> Result<String, ConfigError> {
        if self.0.trim().is_empty() {
            return Err(ConfigError::MissingToken("config api.access_token".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call, so a token
/// refreshed by an external process is picked up without restarting.
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvTokenProvider {
    fn current_access_token(&self) -> Result<String, ConfigError> {
        match env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ConfigError::MissingToken(format!("${}", self.var))),
        }
    }
}

/// Inline token when configured, otherwise the configured environment variable.
pub fn provider_from_config(api: &ApiConfig) -> Box<dyn TokenProvider + Send + Sync> {
    match &api.access_token {
        Some(token) => Box::new(StaticToken::new(token.clone())),
        None => Box::new(EnvTokenProvider::new(api.access_token_env.clone())),
    }
}
