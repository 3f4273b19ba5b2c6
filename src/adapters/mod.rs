//! Infrastructure adapters. Implement and drive the ports.
//!
//! HTTP (inbound), client storage (outbound). Map errors to RepoError / HTTP responses.

pub mod http;
pub mod persistence;
