use super::base::{DocumentStore, Lease, StorageResult};
use super::types::Slot;
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Live/staging/backup slots of one dataset.
///
/// New rows only ever land in staging; `commit` is the one call that touches
/// live, and it does so with a single rename. A run that stops before
/// `commit` leaves live exactly as it was.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn DocumentStore>,
    dataset: String,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn DocumentStore>, dataset: &str) -> Self {
        Self {
            store,
            dataset: dataset.to_string(),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn slot(&self, slot: Slot) -> String {
        slot.collection(&self.dataset)
    }

    /// Clears scratch left by an earlier run and snapshots live into backup.
    pub async fn begin_run(&self) -> StorageResult<()> {
        let staging = self.slot(Slot::Staging);
        let backup = self.slot(Slot::Backup);
        let live = self.slot(Slot::Live);

        self.store.drop_collection(&staging).await?;
        self.store.drop_collection(&backup).await?;
        self.store.copy_all(&live, &backup).await?;

        info!("Backed up {} to {}", live, backup);
        Ok(())
    }

    /// Appends one page worth of documents to staging. Returns how many
    /// were written.
    pub async fn append_batch<T: Serialize>(&self, documents: &[T]) -> StorageResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let values = documents
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        let count = values.len();

        self.store
            .insert_many(&self.slot(Slot::Staging), values)
            .await?;
        debug!("Staged {} documents for {}", count, self.dataset);
        Ok(count)
    }

    /// Promotes staging to live, replacing the previous live set.
    pub async fn commit(&self) -> StorageResult<()> {
        let staging = self.slot(Slot::Staging);
        let live = self.slot(Slot::Live);

        self.store.rename(&staging, &live, true).await?;

        info!("Committed {} to {}", staging, live);
        Ok(())
    }

    /// Takes the dataset's run lease for `ttl`. Returns false while another
    /// owner holds an unexpired lease.
    pub async fn acquire_lock(&self, owner: &str, ttl: Duration) -> StorageResult<bool> {
        self.store.try_acquire_lease(&self.lease(owner, ttl)).await
    }

    /// Pushes the lease expiry `ttl` past now. Returns false once `owner`
    /// no longer holds the lease.
    pub async fn renew_lock(&self, owner: &str, ttl: Duration) -> StorageResult<bool> {
        self.store.renew_lease(&self.lease(owner, ttl)).await
    }

    fn lease(&self, owner: &str, ttl: Duration) -> Lease {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Lease {
            name: self.slot(Slot::Lock),
            owner: owner.to_string(),
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC),
        }
    }

    pub async fn release_lock(&self, owner: &str) -> StorageResult<()> {
        self.store
            .release_lease(&self.slot(Slot::Lock), owner)
            .await
    }

    pub async fn documents(&self, slot: Slot) -> StorageResult<Vec<Value>> {
        self.store.find_all(&self.slot(slot)).await
    }
}
