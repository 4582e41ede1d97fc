use super::base::{DocumentStore, Lease, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Process-local store, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    leases: RwLock<HashMap<String, Lease>>,
    failing: RwLock<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` (`"insert_many"`, `"rename"`,
    /// `"copy_all"`, `"drop_collection"`) fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.write().insert(operation);
    }

    pub fn recover(&self) {
        self.failing.write().clear();
    }

    pub fn seed(&self, collection: &str, documents: Vec<Value>) {
        self.collections
            .write()
            .insert(collection.to_string(), documents);
    }

    /// `None` when the collection does not exist.
    pub fn collection(&self, collection: &str) -> Option<Vec<Value>> {
        self.collections.read().get(collection).cloned()
    }

    pub fn lease(&self, name: &str) -> Option<Lease> {
        self.leases.read().get(name).cloned()
    }

    fn check(&self, operation: &'static str) -> StorageResult<()> {
        if self.failing.read().contains(operation) {
            return Err(StorageError::OperationError(format!(
                "injected failure in {}",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> StorageResult<()> {
        self.check("insert_many")?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> StorageResult<()> {
        self.check("drop_collection")?;
        self.collections.write().remove(collection);
        Ok(())
    }

    async fn rename(
        &self,
        source: &str,
        destination: &str,
        drop_target: bool,
    ) -> StorageResult<()> {
        self.check("rename")?;
        let mut collections = self.collections.write();

        if !collections.contains_key(source) {
            return Err(StorageError::NotFound(source.to_string()));
        }
        if collections.contains_key(destination) && !drop_target {
            return Err(StorageError::OperationError(format!(
                "target collection {} already exists",
                destination
            )));
        }

        if let Some(documents) = collections.remove(source) {
            collections.insert(destination.to_string(), documents);
        }
        Ok(())
    }

    async fn copy_all(&self, source: &str, destination: &str) -> StorageResult<()> {
        self.check("copy_all")?;
        let mut collections = self.collections.write();
        let documents = collections.get(source).cloned().unwrap_or_default();
        collections.insert(destination.to_string(), documents);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Value>> {
        Ok(self.collection(collection).unwrap_or_default())
    }

    async fn try_acquire_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let mut leases = self.leases.write();
        if let Some(current) = leases.get(&lease.name) {
            if !current.yields_to(&lease.owner, Utc::now()) {
                return Ok(false);
            }
        }
        leases.insert(lease.name.clone(), lease.clone());
        Ok(true)
    }

    async fn renew_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let mut leases = self.leases.write();
        match leases.get_mut(&lease.name) {
            Some(current) if current.owner == lease.owner => {
                current.expires_at = lease.expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lease(&self, name: &str, owner: &str) -> StorageResult<()> {
        let mut leases = self.leases.write();
        if leases.get(name).is_some_and(|current| current.owner == owner) {
            leases.remove(name);
        }
        Ok(())
    }
}
