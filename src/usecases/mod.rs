//! Application use cases. Orchestrate domain logic via ports.

pub mod loan_service;

pub use loan_service::LoanService;
