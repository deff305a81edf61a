//! Persistence substrate: string keys mapped to opaque JSON documents.

pub mod json_backend;
pub mod memory;

use crate::errors::LedgerError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Minimal key-value contract the ledger and bill book persist through.
///
/// Values are whole JSON documents; callers always write the full collection.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
