//! Storage setup and initialization

use anyhow::{Context, Result};
use mediatag_core::Config;
use mediatag_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the configured backend and make sure its bucket exists before serving.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to create storage backend")?;

    storage
        .ensure_bucket()
        .await
        .context("Failed to prepare storage bucket")?;

    tracing::info!(
        backend = %storage.backend_type(),
        "Storage initialized successfully"
    );

    Ok(storage)
}
