//! Mediatag Core Library
//!
//! This crate provides core domain models, error types and configuration
//! that are shared across all Mediatag components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CatalogSettings, Config, LocalStorageConfig, OrphanPolicy, S3StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in the mediatag-storage crate
