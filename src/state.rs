//! Shared application state

use crate::config::AppConfig;
use crate::engine::PollEngine;
use crate::registry::LiveRegistry;
use crate::store::{MemoryPollStore, MemoryUserStore, PollStore, UserStore};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub polls: Arc<dyn PollStore>,
    pub users: Arc<dyn UserStore>,
    pub registry: Arc<LiveRegistry>,
    pub engine: PollEngine,
}

impl AppState {
    /// Wire up the state with the bundled in-process stores.
    pub fn new(config: AppConfig) -> Self {
        Self::with_stores(
            config,
            Arc::new(MemoryPollStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }

    /// Wire up the state around externally supplied store backends.
    pub fn with_stores(
        config: AppConfig,
        polls: Arc<dyn PollStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let registry = Arc::new(LiveRegistry::new());
        let engine = PollEngine::new(
            polls.clone(),
            users.clone(),
            registry.clone(),
            config.repeat_voting,
        );

        Self {
            config,
            polls,
            users,
            registry,
            engine,
        }
    }
}
