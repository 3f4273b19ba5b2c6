//! Implements ClientRepo using a single JSON file.
//!
//! The whole client map is cached in memory and rewritten on every save.

use crate::domain::{Client, RepoError};
use crate::ports::ClientRepo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// On-disk layout: ktp_number -> client
#[derive(Debug, Default, Serialize, Deserialize)]
struct ClientsData {
    clients: BTreeMap<String, Client>,
}

/// JSON file-based client storage.
pub struct JsonClientRepo {
    path: PathBuf,
    cache: RwLock<ClientsData>,
}

impl JsonClientRepo {
    /// Open the repository at `path`, loading existing clients. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let repo = Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(ClientsData::default()),
        };
        repo.load().await?;
        Ok(repo)
    }

    async fn load(&self) -> Result<(), RepoError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).map_err(|e| {
                RepoError::new(format!("parse {}: {}", self.path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => ClientsData::default(),
            Err(e) => return Err(RepoError::new(format!("read {}: {}", self.path.display(), e))),
        };
        info!(
            path = %self.path.display(),
            clients = data.clients.len(),
            "loaded clients"
        );
        *self.cache.write().await = data;
        Ok(())
    }

    /// Write-replace: temp file, sync_all, then rename over the target.
    async fn persist(&self, data: &ClientsData) -> Result<(), RepoError> {
        let json = serde_json::to_string_pretty(data).map_err(|e| RepoError::new(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::new(format!("create data dir: {}", e)))?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        let result = Self::replace(&temp_path, &self.path, json.as_bytes()).await;
        if result.is_err() {
            // Ignored: the temp file may not have been created.
            let _ = fs::remove_file(&temp_path).await;
        }
        result
    }

    async fn replace(temp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), RepoError> {
        let mut f = fs::File::create(temp_path)
            .await
            .map_err(|e| RepoError::new(format!("create temp file: {}", e)))?;
        f.write_all(bytes)
            .await
            .map_err(|e| RepoError::new(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| RepoError::new(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(temp_path, path)
            .await
            .map_err(|e| RepoError::new(format!("atomic rename failed: {}", e)))
    }
}

#[async_trait::async_trait]
impl ClientRepo for JsonClientRepo {
    async fn by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, RepoError> {
        let cache = self.cache.read().await;
        Ok(cache.clients.get(ktp_number).cloned())
    }

    async fn save(&self, client: &Client) -> Result<(), RepoError> {
        // Holding the write lock across the file write keeps saves ordered.
        let mut cache = self.cache.write().await;
        let previous = cache
            .clients
            .insert(client.ktp_number().to_string(), client.clone());
        if let Err(e) = self.persist(&cache).await {
            match previous {
                Some(p) => cache.clients.insert(client.ktp_number().to_string(), p),
                None => cache.clients.remove(client.ktp_number()),
            };
            return Err(e);
        }
        debug!(ktp_number = client.ktp_number(), path = %self.path.display(), "saved client");
        Ok(())
    }
}
