use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Operation error: {0}")]
    OperationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Collection not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Exclusive, expiring claim on a named resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub name: String,
    pub owner: String,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether `owner` may take this lease over at `now`.
    pub fn yields_to(&self, owner: &str, now: DateTime<Utc>) -> bool {
        self.owner == owner || self.is_expired(now)
    }
}

/// Collection-level primitives of the backing document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> StorageResult<()>;

    /// Dropping a collection that does not exist is not an error.
    async fn drop_collection(&self, collection: &str) -> StorageResult<()>;

    /// Renames `source` to `destination` as one step, replacing the
    /// destination when `drop_target` is set.
    async fn rename(&self, source: &str, destination: &str, drop_target: bool)
        -> StorageResult<()>;

    /// Replaces `destination` with a copy of `source`; a missing source
    /// leaves an empty destination.
    async fn copy_all(&self, source: &str, destination: &str) -> StorageResult<()>;

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Value>>;

    /// Returns false while another owner holds an unexpired lease.
    async fn try_acquire_lease(&self, lease: &Lease) -> StorageResult<bool>;

    /// Moves the expiry of a lease `lease.owner` still holds. Returns false
    /// when the lease is gone or belongs to someone else.
    async fn renew_lease(&self, lease: &Lease) -> StorageResult<bool>;

    async fn release_lease(&self, name: &str, owner: &str) -> StorageResult<()>;
}
