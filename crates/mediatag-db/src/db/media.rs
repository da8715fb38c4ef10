use std::collections::BTreeSet;

use async_trait::async_trait;
use mediatag_core::models::{Media, MediaDraft, MediaTagAssociation, MediaWithTags};
use sqlx::{PgPool, Postgres};

use super::error::{MediaStoreError, TagAssociationError};

/// Projection of one media row with its aggregated tag names.
///
/// LEFT JOINs so that a media without associations still comes back, with an
/// empty tag list.
const MEDIA_WITH_TAGS_SELECT: &str = r#"
    SELECT m.id, m.name, m.description, m.file_url,
           COALESCE(
               ARRAY_AGG(DISTINCT t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS tag_names
    FROM media m
    LEFT JOIN media_tags mt ON mt.media_id = m.id
    LEFT JOIN tags t ON t.id = mt.tag_id
"#;

/// Media Store: media records and their tag associations.
///
/// The seam the cataloging service is built against; `MediaRepository` is the
/// Postgres implementation.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Whether a media with this exact name is already catalogued.
    async fn name_exists(&self, name: &str) -> Result<bool, MediaStoreError>;

    /// Create the media row (once per name), then attach every tag in one
    /// all-or-nothing transaction. Returns the new media id.
    async fn create_with_tags(
        &self,
        draft: MediaDraft,
        tag_ids: &[i64],
    ) -> Result<i64, MediaStoreError>;

    /// Every media associated with `tag_id`, each with its full tag name set.
    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<MediaWithTags>, MediaStoreError>;

    /// Every catalogued media, ordered by id.
    async fn find_all(&self) -> Result<Vec<MediaWithTags>, MediaStoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<MediaWithTags>, MediaStoreError>;
}

/// Repository for media and media/tag associations
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach `tag_ids` to `media_id` inside one transaction.
    ///
    /// Every early return drops `tx`, which rolls it back.
    #[tracing::instrument(skip(self), fields(db.table = "media_tags", db.operation = "insert"))]
    async fn associate_tags(
        &self,
        media_id: i64,
        tag_ids: &[i64],
    ) -> Result<(), TagAssociationError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(TagAssociationError::Begin)?;

        // FOR KEY SHARE keeps the tags from being deleted until commit
        let found = sqlx::query_scalar::<Postgres, i64>(
            "SELECT id FROM tags WHERE id = ANY($1) FOR KEY SHARE",
        )
        .bind(tag_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(TagAssociationError::Lookup)?;

        if found.len() != tag_ids.len() {
            if let Err(e) = tx.rollback().await {
                tracing::error!(error = %e, media_id, "Failed to rollback tag association");
            }
            return Err(TagAssociationError::MissingTags {
                requested: tag_ids.len(),
                found: found.len(),
            });
        }

        for &tag_id in tag_ids {
            sqlx::query("INSERT INTO media_tags (media_id, tag_id) VALUES ($1, $2)")
                .bind(media_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(|source| TagAssociationError::Insert { tag_id, source })?;
        }

        tx.commit().await.map_err(TagAssociationError::Commit)?;

        Ok(())
    }

    async fn aggregate_one(&self, media_id: i64) -> Result<Option<MediaWithTags>, sqlx::Error> {
        let query = format!("{} WHERE m.id = $1 GROUP BY m.id", MEDIA_WITH_TAGS_SELECT);
        sqlx::query_as::<Postgres, MediaWithTags>(&query)
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Raw media row, without the tag projection.
    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = id))]
    pub async fn find_record(&self, id: i64) -> Result<Option<Media>, MediaStoreError> {
        sqlx::query_as::<Postgres, Media>(
            r#"
            SELECT id, name, description, file_url, file_size, created_at, updated_at
            FROM media
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(MediaStoreError::Retrieval)
    }

    /// Association rows committed for `media_id`, ordered by tag id.
    #[tracing::instrument(skip(self), fields(db.table = "media_tags", db.operation = "select"))]
    pub async fn associations(
        &self,
        media_id: i64,
    ) -> Result<Vec<MediaTagAssociation>, MediaStoreError> {
        sqlx::query_as::<Postgres, MediaTagAssociation>(
            "SELECT media_id, tag_id, created_at FROM media_tags WHERE media_id = $1 ORDER BY tag_id",
        )
        .bind(media_id)
        .fetch_all(&self.pool)
        .await
        .map_err(MediaStoreError::Retrieval)
    }
}

/// Sorted, duplicate-free copy of the requested tag ids.
fn distinct_tag_ids(tag_ids: &[i64]) -> Vec<i64> {
    tag_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl MediaStore for MediaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn name_exists(&self, name: &str) -> Result<bool, MediaStoreError> {
        sqlx::query_scalar::<Postgres, bool>("SELECT EXISTS(SELECT 1 FROM media WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(MediaStoreError::Retrieval)
    }

    #[tracing::instrument(
        skip(self, draft),
        fields(db.table = "media", db.operation = "insert", media.name = %draft.name)
    )]
    async fn create_with_tags(
        &self,
        draft: MediaDraft,
        tag_ids: &[i64],
    ) -> Result<i64, MediaStoreError> {
        let tag_ids = distinct_tag_ids(tag_ids);

        // Single round trip: the unique constraint on name is the only gate
        // between concurrent creates of the same name.
        let inserted = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO media (name, description, file_url, file_size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.file_url)
        .bind(draft.file_size)
        .fetch_optional(&self.pool)
        .await
        .map_err(MediaStoreError::Creation)?;

        let media_id = match inserted {
            Some(id) => id,
            None => return Err(MediaStoreError::AlreadyExists(draft.name)),
        };

        self.associate_tags(media_id, &tag_ids)
            .await
            .map_err(|source| {
                tracing::warn!(
                    error = %source,
                    media_id,
                    "Tag association rolled back, media row left without tags"
                );
                MediaStoreError::DbOperation { media_id, source }
            })?;

        tracing::info!(media_id, tag_count = tag_ids.len(), "Media catalogued");

        Ok(media_id)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_tags", db.operation = "select"))]
    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<MediaWithTags>, MediaStoreError> {
        let media_ids = sqlx::query_scalar::<Postgres, i64>(
            "SELECT media_id FROM media_tags WHERE tag_id = $1 ORDER BY media_id",
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(MediaStoreError::Retrieval)?;

        let mut results = Vec::with_capacity(media_ids.len());
        for media_id in media_ids {
            match self.aggregate_one(media_id).await {
                Ok(Some(media)) => results.push(media),
                Ok(None) => {
                    tracing::warn!(media_id, tag_id, "Media vanished during lookup, skipping");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        media_id,
                        tag_id,
                        "Failed to aggregate tags for media, skipping"
                    );
                }
            }
        }

        Ok(results)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn find_all(&self) -> Result<Vec<MediaWithTags>, MediaStoreError> {
        let query = format!("{} GROUP BY m.id ORDER BY m.id", MEDIA_WITH_TAGS_SELECT);
        sqlx::query_as::<Postgres, MediaWithTags>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(MediaStoreError::Retrieval)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<MediaWithTags>, MediaStoreError> {
        self.aggregate_one(id)
            .await
            .map_err(MediaStoreError::Retrieval)
    }
}
