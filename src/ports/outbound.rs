//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Client, RepoError};

/// Client repository. Loads and stores clients together with their active loan.
///
/// Keeps the service independent of the storage technology. Each call must be
/// atomic on its own; the service serializes read-modify-write of one KTP number.
#[async_trait::async_trait]
pub trait ClientRepo: Send + Sync {
    /// Look up a client. `Ok(None)` when no client is stored under `ktp_number`.
    async fn by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, RepoError>;

    /// Store `client`, replacing any previous record with the same KTP number.
    async fn save(&self, client: &Client) -> Result<(), RepoError>;
}
