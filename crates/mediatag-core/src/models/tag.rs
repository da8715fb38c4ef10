use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Longest tag name accepted at the API boundary.
pub const TAG_NAME_MAX_LEN: usize = 255;

/// A known tag. Names are unique and matched exactly when joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a tag
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTagRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Tag name must be between 1 and 255 characters"
    ))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTagResponse {
    pub id: i64,
    /// False when a tag with this name already existed
    pub created: bool,
}

/// Result of an insert-if-absent: the row id plus how many rows the insert touched.
///
/// `rows_affected == 0` means the row already existed and `id` is the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub rows_affected: u64,
}

impl UpsertOutcome {
    pub fn created(&self) -> bool {
        self.rows_affected > 0
    }
}

impl From<UpsertOutcome> for CreateTagResponse {
    fn from(outcome: UpsertOutcome) -> Self {
        CreateTagResponse {
            id: outcome.id,
            created: outcome.created(),
        }
    }
}
