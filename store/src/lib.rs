//! Local store interface and implementations.
//!
//! The SDK persists a small number of records (auth token, cached user
//! identity) between cold starts. This crate provides the trait the rest
//! of the workspace programs against, an in-memory implementation for
//! tests, and a redb-backed implementation for real persistence.

pub mod memory;
pub mod redb;

use std::fmt;
use thiserror::Error;

/// Well-known keys used by the session layer.
pub mod keys {
    /// Bearer token for the remote API.
    pub const TOKEN: &str = "session:token";
    /// JSON-encoded user identity matching the token.
    pub const IDENTITY: &str = "session:identity";
}

/// Errors that can occur in local store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Local key-value persistence.
///
/// Values are opaque bytes; the session layer encodes its records with
/// serde_json before handing them down. A missing key is `Ok(None)`,
/// never an error, and `delete` of an absent key is a no-op.
pub trait LocalStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Set a key-value pair, replacing any existing value.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete a key.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

impl fmt::Debug for dyn LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalStore {{ ... }}")
    }
}

pub use memory::MemoryStore;
pub use self::redb::RedbStore;
