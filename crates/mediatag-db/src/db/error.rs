use mediatag_core::AppError;
use thiserror::Error;

/// Failure inside the tag association transaction.
///
/// Whatever the variant, the transaction was rolled back and no association
/// row for the media was committed.
#[derive(Debug, Error)]
pub enum TagAssociationError {
    #[error("some tags do not exist: {found} of {requested} requested tags found")]
    MissingTags { requested: usize, found: usize },

    #[error("failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("failed to resolve tags: {0}")]
    Lookup(#[source] sqlx::Error),

    #[error("failed to associate tag {tag_id}: {source}")]
    Insert {
        tag_id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

/// Media Store failures
#[derive(Debug, Error)]
pub enum MediaStoreError {
    /// A media with this name is already catalogued; nothing was written.
    #[error("media with name '{0}' already exists")]
    AlreadyExists(String),

    #[error("failed to create media: {0}")]
    Creation(#[source] sqlx::Error),

    /// The media row exists but tagging it failed and was rolled back.
    #[error("failed to associate tags with media {media_id}: {source}")]
    DbOperation {
        media_id: i64,
        #[source]
        source: TagAssociationError,
    },

    #[error("failed to retrieve media: {0}")]
    Retrieval(#[source] sqlx::Error),
}

impl From<MediaStoreError> for AppError {
    fn from(err: MediaStoreError) -> Self {
        match err {
            MediaStoreError::AlreadyExists(name) => {
                AppError::Conflict(format!("Media with name '{}' already exists", name))
            }
            MediaStoreError::Creation(e) | MediaStoreError::Retrieval(e) => AppError::Database(e),
            MediaStoreError::DbOperation { source, .. } => match source {
                TagAssociationError::MissingTags { requested, found } => {
                    AppError::UnknownTags { requested, found }
                }
                TagAssociationError::Begin(e)
                | TagAssociationError::Lookup(e)
                | TagAssociationError::Commit(e)
                | TagAssociationError::Insert { source: e, .. } => AppError::Database(e),
            },
        }
    }
}
