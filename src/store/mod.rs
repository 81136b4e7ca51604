//! Patient/appointment data stores: a synchronous locally-persisted store
//! and an asynchronous remotely-backed store with push subscription.

pub mod http_remote;
pub mod local;
pub mod remote;
pub mod storage;

use thiserror::Error;

pub use http_remote::HttpRemoteService;
pub use local::LocalDataStore;
pub use remote::{RemoteDataService, RemoteStore, SubscriptionHandle};
pub use storage::{FsStorage, MemoryStorage, StorageBackend};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Lock poisoned")]
    LockPoisoned,
}
