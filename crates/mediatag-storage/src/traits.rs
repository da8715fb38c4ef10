//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Bucket setup failed: {0}")]
    BucketSetup(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A successfully uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object name inside the bucket, `{uuid}{.ext}`
    pub key: String,
    /// Public URL the media record points at
    pub url: String,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// Backends never retry internally; a failed call surfaces immediately and
/// retry policy is left to the caller.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Make sure the destination bucket (or directory) exists.
    ///
    /// Idempotent: a bucket that already exists is success.
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// Store `data` under a freshly generated object name.
    ///
    /// `original_filename` only contributes its extension.
    async fn upload(
        &self,
        data: Bytes,
        original_filename: &str,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Delete an object by key. Deleting a missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
