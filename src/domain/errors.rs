//! Domain and service errors.
//!
//! Display strings of the business-rule variants double as stable machine codes.
//! Adapters map infrastructure failures into `RepoError`.

use crate::domain::entities::Client;
use serde_json::{Value, json};
use thiserror::Error;

/// Business-rule violations raised by `Client` and `Loan`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    /// Client still has an active (unpaid) loan.
    #[error("client_already_has_loan")]
    AlreadyHasLoan,

    /// Requested amount exceeds the ceiling for a first loan.
    #[error("amount_too_high")]
    AmountTooHigh { max_amount: u64 },

    /// Repayment exceeds what is left on the loan.
    #[error("repayment_amount_too_high")]
    RepaymentTooHigh { remaining: u64 },

    #[error("client_has_no_active_loan")]
    NoActiveLoan,
}

impl LoanError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyHasLoan => "client_already_has_loan",
            Self::AmountTooHigh { .. } => "amount_too_high",
            Self::RepaymentTooHigh { .. } => "repayment_amount_too_high",
            Self::NoActiveLoan => "client_has_no_active_loan",
        }
    }

    /// Numbers a caller needs to correct the request.
    pub fn params(&self) -> Value {
        match self {
            Self::AmountTooHigh { max_amount } => json!({ "MaxAmount": max_amount }),
            Self::RepaymentTooHigh { remaining } => json!({ "Remaining": remaining }),
            Self::AlreadyHasLoan | Self::NoActiveLoan => json!({}),
        }
    }
}

/// Failure reported by a client repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RepoError(pub String);

impl RepoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by the application service.
#[derive(Error, Debug)]
pub enum LmsError {
    /// Registration for a KTP number already on record. Carries the stored client.
    #[error("client_already_exists")]
    ClientAlreadyExists { existing: Box<Client> },

    #[error("client_does_not_exist")]
    ClientNotFound,

    #[error(transparent)]
    Loan(#[from] LoanError),

    /// Repository failure, prefixed with the operation and its parameters.
    #[error("{context}: {source}")]
    Repository {
        context: String,
        #[source]
        source: RepoError,
    },
}

impl LmsError {
    pub(crate) fn repository(context: impl Into<String>, source: RepoError) -> Self {
        Self::Repository {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ClientAlreadyExists { .. } => "client_already_exists",
            Self::ClientNotFound => "client_does_not_exist",
            Self::Loan(e) => e.code(),
            Self::Repository { .. } => "server_error",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Self::Loan(e) => e.params(),
            Self::Repository { .. } => json!({ "TechnicalError": self.to_string() }),
            Self::ClientAlreadyExists { .. } | Self::ClientNotFound => json!({}),
        }
    }
}
