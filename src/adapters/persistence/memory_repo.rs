//! Implements ClientRepo with a map held in memory. Nothing survives a restart.

use crate::domain::{Client, RepoError};
use crate::ports::ClientRepo;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory repository keyed by KTP number. Default backend and test double.
#[derive(Debug, Default)]
pub struct MemoryClientRepo {
    clients: RwLock<HashMap<String, Client>>,
}

impl MemoryClientRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ClientRepo for MemoryClientRepo {
    async fn by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, RepoError> {
        Ok(self.clients.read().await.get(ktp_number).cloned())
    }

    async fn save(&self, client: &Client) -> Result<(), RepoError> {
        self.clients
            .write()
            .await
            .insert(client.ktp_number().to_string(), client.clone());
        Ok(())
    }
}
