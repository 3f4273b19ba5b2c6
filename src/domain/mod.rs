//! Core domain layer. No external I/O dependencies.
//!
//! Clients, loans and the rules binding them live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{Client, ClientData, InvalidLoan, Loan, MAXIMUM_AMOUNT_FOR_FIRST_LOAN, Term};
pub use errors::{LmsError, LoanError, RepoError};
