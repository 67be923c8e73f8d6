//! Repository implementations: SQLite via libsql, and an in-process store.

pub mod memory_repo;
pub mod sqlite_repo;

pub use memory_repo::MemoryStore;
pub use sqlite_repo::SqliteStore;
