//! Cross-cutting helpers shared by the binary and adapters.

pub mod config;
