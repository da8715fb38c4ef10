use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mediatag_core::models::{CreateTagRequest, CreateTagResponse, Tag};
use mediatag_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct TagListQuery {
    /// Case-insensitive substring of the tag name
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    params(TagListQuery),
    responses(
        (status = 200, description = "Tags ordered by name", body = Vec<Tag>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TagListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tags = match query.name {
        Some(fragment) => state.tag_repository.find_by_name_substring(&fragment).await?,
        None => state.tag_repository.find_all().await?,
    };
    Ok(Json(tags))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = CreateTagResponse),
        (status = 200, description = "Tag already existed", body = CreateTagResponse),
        (status = 400, description = "Invalid tag name", body = ErrorResponse)
    )
)]
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateTagRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = CreateTagRequest {
        name: request.name.trim().to_string(),
    };
    request.validate().map_err(AppError::from)?;

    let outcome = state.tag_repository.create(&request.name).await?;
    let status = if outcome.created() {
        tracing::info!(tag_id = outcome.id, name = %request.name, "Tag created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(CreateTagResponse::from(outcome))))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.tag_repository.delete(id).await? {
        return Err(AppError::NotFound(format!("Tag {} not found", id)).into());
    }
    tracing::info!(tag_id = id, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}
