use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest media name accepted by the cataloging write path.
pub const MEDIA_NAME_MAX_LEN: usize = 255;

/// Matches the `VARCHAR(100)` column on `media.description`.
pub const MEDIA_DESCRIPTION_MAX_LEN: usize = 100;

/// Media record. The name is the natural idempotency key: at most one row per name.
///
/// `file_url` points at an object owned by the object store; the record only
/// references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Media {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Media fields known before the row exists (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDraft {
    pub name: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_size: i64,
}

/// Junction row between a media and a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaTagAssociation {
    pub media_id: i64,
    pub tag_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Read projection: a media row with the names of every tag attached to it.
///
/// Built per query from the association table, never persisted or cached.
/// Tag names are distinct; callers must not rely on their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaWithTags {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub file_url: String,
    pub tag_names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMediaResponse {
    pub id: i64,
}
