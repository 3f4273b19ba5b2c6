//! Loans management use cases: register, look up, apply for a loan, repay.
//!
//! - Business rules live in `Client`; their errors pass through unwrapped
//! - Repository failures are wrapped with the operation and its parameters
//! - Every mutation is saved back before returning
//! - Lookup, mutation and save of one KTP number run under that number's lock

use crate::domain::{Client, ClientData, LmsError, Loan, Term};
use crate::ports::{ClientRepo, Lms};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// Application service. Implements `Lms` on top of a `ClientRepo`.
pub struct LoanService {
    repo: Arc<dyn ClientRepo>,
    /// One writer per KTP number. Entries nobody holds or waits on are pruned.
    writers: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LoanService {
    pub fn new(repo: Arc<dyn ClientRepo>) -> Self {
        Self {
            repo,
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive write access to `ktp_number`.
    async fn lock_client(&self, ktp_number: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut writers = self.writers.lock().await;
            writers.retain(|_, lock| Arc::strong_count(lock) > 1);
            writers
                .entry(ktp_number.to_string())
                .or_default()
                .clone()
        };
        if lock.try_lock().is_err() {
            debug!(ktp_number, "waiting for concurrent write");
        }
        lock.lock_owned().await
    }

    /// Load a client that must exist, wrapping repository failures in `context`.
    async fn existing_client(&self, ktp_number: &str, context: &str) -> Result<Client, LmsError> {
        match self.repo.by_ktp_number(ktp_number).await {
            Ok(Some(client)) => Ok(client),
            Ok(None) => {
                warn!(ktp_number, "client does not exist");
                Err(LmsError::ClientNotFound)
            }
            Err(e) => {
                error!(ktp_number, error = %e, "{}", context);
                Err(LmsError::repository(context, e))
            }
        }
    }

    async fn save(&self, client: &Client, context: &str) -> Result<(), LmsError> {
        self.repo.save(client).await.map_err(|e| {
            error!(ktp_number = client.ktp_number(), error = %e, "{}", context);
            LmsError::repository(context, e)
        })
    }
}

#[async_trait::async_trait]
impl Lms for LoanService {
    async fn register_client(&self, data: ClientData) -> Result<Client, LmsError> {
        let context = format!(
            "registering client {} {} with ktp number {}",
            data.birth_date, data.name, data.ktp_number
        );
        let _writer = self.lock_client(&data.ktp_number).await;
        let found = self
            .repo
            .by_ktp_number(&data.ktp_number)
            .await
            .map_err(|e| {
                error!(ktp_number = %data.ktp_number, error = %e, "client lookup failed");
                LmsError::repository(context.as_str(), e)
            })?;
        if let Some(existing) = found {
            warn!(ktp_number = %data.ktp_number, "client already exists");
            return Err(LmsError::ClientAlreadyExists {
                existing: Box::new(existing),
            });
        }

        let client = Client::new(data);
        self.save(&client, &context).await?;
        info!(ktp_number = client.ktp_number(), "registered client");
        Ok(client)
    }

    async fn client_by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, LmsError> {
        self.repo.by_ktp_number(ktp_number).await.map_err(|e| {
            error!(ktp_number, error = %e, "client lookup failed");
            LmsError::repository(format!("loading client by ktp number {}", ktp_number), e)
        })
    }

    async fn apply_for_loan(
        &self,
        ktp_number: &str,
        amount: u64,
        term: Term,
    ) -> Result<(), LmsError> {
        let context = format!(
            "client {} is applying for {} loan with term {}",
            ktp_number, amount, term
        );
        let _writer = self.lock_client(ktp_number).await;
        let mut client = self.existing_client(ktp_number, &context).await?;
        if let Err(e) = client.apply_for_loan(amount, term) {
            warn!(ktp_number, amount, term = term.days(), reason = %e, "loan application rejected");
            return Err(e.into());
        }
        self.save(&client, &context).await?;
        info!(ktp_number, amount, term = term.days(), "loan granted");
        Ok(())
    }

    async fn repay(&self, ktp_number: &str, amount: u64) -> Result<Option<Loan>, LmsError> {
        let context = format!("client {} is repaying {}", ktp_number, amount);
        let _writer = self.lock_client(ktp_number).await;
        let mut client = self.existing_client(ktp_number, &context).await?;
        if let Err(e) = client.repay(amount) {
            warn!(ktp_number, amount, reason = %e, "repayment rejected");
            return Err(e.into());
        }
        self.save(&client, &context).await?;
        let loan = client.active_loan().cloned();
        match &loan {
            Some(l) => info!(ktp_number, amount, remaining = l.remaining(), "repayment accepted"),
            None => info!(ktp_number, amount, "loan fully repaid"),
        }
        Ok(loan)
    }
}
