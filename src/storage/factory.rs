use super::base::{DocumentStore, StorageResult};
#[cfg(feature = "mongodb")]
use super::MongoStore;
use super::{DiskStore, MemoryStore};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum StoreType {
    Disk {
        path: String,
    },
    #[cfg(feature = "mongodb")]
    Mongo {
        connection_string: String,
        database: String,
    },
    Memory,
}

pub async fn create_store(store_type: StoreType) -> StorageResult<Arc<dyn DocumentStore>> {
    match store_type {
        StoreType::Disk { path } => Ok(Arc::new(DiskStore::new(path)?)),
        #[cfg(feature = "mongodb")]
        StoreType::Mongo {
            connection_string,
            database,
        } => Ok(Arc::new(
            MongoStore::new(&connection_string, &database).await?,
        )),
        StoreType::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
