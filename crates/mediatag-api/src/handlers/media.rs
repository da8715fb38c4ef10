use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_catalog_upload;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mediatag_core::models::{CreateMediaResponse, MediaWithTags};
use mediatag_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MediaListQuery {
    /// Tag ID to filter by; omit to list every media
    pub tag: Option<String>,
}

/// Blank means no filter; anything else must be a tag id.
fn parse_tag_filter(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::InvalidInput(format!("Invalid tag id: {}", value))),
    }
}

#[utoipa::path(
    get,
    path = "/api/medias",
    tag = "media",
    params(MediaListQuery),
    responses(
        (status = 200, description = "Matching media, possibly empty", body = Vec<MediaWithTags>),
        (status = 400, description = "Tag filter is not a number", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MediaListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tag_id = parse_tag_filter(query.tag.as_deref())?;
    let media = state.catalog.get_by_tag(tag_id).await?;
    Ok(Json(media))
}

#[utoipa::path(
    get,
    path = "/api/medias/{id}",
    tag = "media",
    params(
        ("id" = i64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Media found", body = MediaWithTags),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let media = state.catalog.get_media(id).await?;
    Ok(Json(media))
}

#[utoipa::path(
    post,
    path = "/api/medias",
    tag = "media",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: name (text), tags (JSON array of tag ids), description (optional text), file (binary)"
    ),
    responses(
        (status = 201, description = "Media uploaded and catalogued", body = CreateMediaResponse),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 409, description = "Media name already exists", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Some tags do not exist", body = ErrorResponse),
        (status = 502, description = "Object storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_catalog_upload(multipart).await?;
    let id = state.catalog.upload_and_catalog(upload).await?;
    Ok((StatusCode::CREATED, Json(CreateMediaResponse { id })))
}
