pub mod base;
pub mod disk;
pub mod factory;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod snapshot;
pub mod types;

pub use base::{DocumentStore, Lease, StorageError, StorageResult};
pub use disk::DiskStore;
pub use factory::{create_store, StoreType};
pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
pub use snapshot::SnapshotStore;
pub use types::Slot;
