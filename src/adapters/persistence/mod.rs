//! Client storage backends. Selected at startup from `AppConfig::storage`.

pub mod json_repo;
pub mod memory_repo;
pub mod sqlite_repo;

pub use json_repo::JsonClientRepo;
pub use memory_repo::MemoryClientRepo;
pub use sqlite_repo::SqliteClientRepo;
