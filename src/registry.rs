//! Registry of connected live-update clients
//!
//! Owns the client set outright; connection handlers only ever go through
//! `register`/`unregister`/`broadcast`. Fan-out is fire-and-forget through
//! per-client unbounded queues, so one slow or dead client cannot stall or
//! abort delivery to the rest.

use crate::protocol::ServerMessage;
use crate::types::ClientId;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

/// Send half of a client's outbound event queue.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

#[derive(Default)]
pub struct LiveRegistry {
    clients: RwLock<HashMap<ClientId, ClientSender>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client, returning the id to unregister with later.
    pub async fn register(&self, sender: ClientSender) -> ClientId {
        let id = ulid::Ulid::new().to_string();
        self.clients.write().await.insert(id.clone(), sender);
        tracing::info!("live client {} connected", id);
        id
    }

    /// Remove a client. A no-op when the client is already gone, so
    /// disconnect notifications racing a failed broadcast are harmless.
    pub async fn unregister(&self, id: &ClientId) {
        if self.clients.write().await.remove(id).is_some() {
            tracing::info!("live client {} disconnected", id);
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Fan an event out to every connected client.
    ///
    /// A failed send means the receiving task is gone; the client is dropped
    /// from the registry and delivery continues to the others.
    pub async fn broadcast(&self, event: ServerMessage) {
        let dead: Vec<ClientId> = {
            let clients = self.clients.read().await;
            clients
                .iter()
                .filter(|(_, sender)| sender.send(event.clone()).is_err())
                .map(|(id, _)| id.clone())
                .collect()
        };

        if !dead.is_empty() {
            let mut clients = self.clients.write().await;
            for id in &dead {
                clients.remove(id);
            }
            tracing::debug!("dropped {} dead live clients during broadcast", dead.len());
        }
    }
}
