//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use mediatag_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediatag API",
        version = "0.1.0",
        description = "Media catalog API: upload files to object storage, attach tags atomically and query media by tag."
    ),
    paths(
        handlers::health::health_check,
        handlers::tags::list_tags,
        handlers::tags::create_tag,
        handlers::tags::delete_tag,
        handlers::media::list_media,
        handlers::media::get_media,
        handlers::media::upload_media,
    ),
    components(
        schemas(
            models::Tag,
            models::CreateTagRequest,
            models::CreateTagResponse,
            models::MediaWithTags,
            models::CreateMediaResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness and database connectivity"),
        (name = "tags", description = "Tag management"),
        (name = "media", description = "Media upload and tag-filtered queries")
    )
)]
pub struct ApiDoc;
