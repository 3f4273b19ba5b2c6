//! REST adapter (axum). Maps HTTP requests onto `Lms` use cases.

pub mod dto;
pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{LoansServer, create_router};
