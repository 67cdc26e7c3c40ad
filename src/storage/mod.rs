//! Durable key-value storages the task store can be backed by
//!
//! See [`KeyValueStorage`](crate::traits::KeyValueStorage).

use std::path::PathBuf;

use thiserror::Error;

pub mod memory_storage;
pub use memory_storage::MemoryStorage;
pub mod file_storage;
pub use file_storage::FileStorage;

/// A storage read or write that failed. These can be retried
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}
