//! Inbound port. HTTP (adapter) calls into the application.

use crate::domain::{Client, ClientData, LmsError, Loan, Term};

/// Loans management system: one method per use case.
#[async_trait::async_trait]
pub trait Lms: Send + Sync {
    /// Register a new client.
    ///
    /// # Errors
    /// `LmsError::ClientAlreadyExists` carries the client already on record.
    async fn register_client(&self, data: ClientData) -> Result<Client, LmsError>;

    /// Find a client. `Ok(None)` when the KTP number is unknown.
    async fn client_by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, LmsError>;

    /// Open a loan for an existing client.
    async fn apply_for_loan(
        &self,
        ktp_number: &str,
        amount: u64,
        term: Term,
    ) -> Result<(), LmsError>;

    /// Repay part of the active loan. Returns the loan while something remains,
    /// `None` once it is fully repaid.
    async fn repay(&self, ktp_number: &str, amount: u64) -> Result<Option<Loan>, LmsError>;
}
