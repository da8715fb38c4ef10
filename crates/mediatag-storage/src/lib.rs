//! Mediatag Storage Library
//!
//! Object Store Adapter for the catalog: the [`Storage`] trait plus S3 (and
//! S3-compatible, e.g. MinIO) and local filesystem backends.
//!
//! # Object names
//!
//! Every upload gets a fresh name `{uuid}{.ext}` where the extension comes from
//! the client's original filename. Names are flat (no `/`), so two uploads of
//! the same file never collide. See the `keys` module.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

use mediatag_core::AppError;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediatag_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}
