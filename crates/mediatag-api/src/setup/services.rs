//! Service initialization and application state setup

use crate::state::AppState;
use mediatag_core::Config;
use mediatag_db::{MediaRepository, MediaStore, TagRepository};
use mediatag_services::{CatalogConfig, CatalogService};
use mediatag_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Initialize repositories and services, returning the application state
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let tag_repository = TagRepository::new(pool.clone());
    let media_store: Arc<dyn MediaStore> = Arc::new(MediaRepository::new(pool.clone()));

    let catalog_config = CatalogConfig::from(&config.catalog);
    tracing::info!(
        max_file_size_bytes = catalog_config.max_file_size_bytes,
        operation_timeout_secs = catalog_config.operation_timeout.as_secs(),
        orphan_policy = ?catalog_config.orphan_policy,
        "Catalog service configured"
    );
    let catalog = CatalogService::new(storage, media_store, catalog_config);

    Arc::new(AppState {
        pool,
        tag_repository,
        catalog,
    })
}
