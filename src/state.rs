use anyhow::Context;
use std::sync::Arc;

use crate::{
    auth::SignedTokenProvider,
    config::Config,
    core::{Dimensions, GridStore, DEFAULT_SUBSCRIBER_BUFFER},
    services::SyncHub,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub grid: Arc<GridStore>,
    pub sync_hub: SyncHub,
    pub identity: Arc<SignedTokenProvider>,
    /// Mark session cookies `Secure` (off in development)
    pub secure_cookies: bool,
}

impl AppState {
    /// In-memory state with default buffering, used by tests
    pub fn new(dimensions: Dimensions, secret_key: impl Into<String>) -> Self {
        Self {
            grid: Arc::new(GridStore::new(dimensions)),
            sync_hub: SyncHub::new(DEFAULT_SUBSCRIBER_BUFFER),
            identity: Arc::new(SignedTokenProvider::new(secret_key)),
            secure_cookies: false,
        }
    }

    /// Build state from configuration, replaying the claim journal if one is set
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let grid = match &config.claim_journal {
            Some(path) => GridStore::with_journal(config.dimensions, path)
                .with_context(|| format!("opening claim journal {}", path.display()))?,
            None => GridStore::new(config.dimensions),
        };

        Ok(Self {
            grid: Arc::new(grid),
            sync_hub: SyncHub::new(config.subscriber_buffer),
            identity: Arc::new(SignedTokenProvider::new(config.secret_key.clone())),
            secure_cookies: !config.is_development(),
        })
    }
}
