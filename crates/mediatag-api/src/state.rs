//! Application state shared by all handlers.

use mediatag_db::TagRepository;
use mediatag_services::CatalogService;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tag_repository: TagRepository,
    pub catalog: CatalogService,
}
