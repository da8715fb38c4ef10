use mediatag_core::{
    models::{Tag, UpsertOutcome},
    AppError,
};
use sqlx::{PgPool, Postgres};

/// Repository for the tag catalog
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a tag unless one with the same name exists.
    ///
    /// Never fails on a duplicate name: the existing id comes back with
    /// `rows_affected == 0`.
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "insert"))]
    pub async fn create(&self, name: &str) -> Result<UpsertOutcome, AppError> {
        let inserted = sqlx::query_scalar::<Postgres, i64>(
            "INSERT INTO tags (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            return Ok(UpsertOutcome {
                id,
                rows_affected: 1,
            });
        }

        let id = sqlx::query_scalar::<Postgres, i64>("SELECT id FROM tags WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(tag_id = id, "Tag already exists");

        Ok(UpsertOutcome {
            id,
            rows_affected: 0,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    pub async fn find_all(&self) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<Postgres, Tag>(
            "SELECT id, name, created_at, updated_at FROM tags ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Case-insensitive contains match. A blank fragment lists every tag.
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    pub async fn find_by_name_substring(&self, fragment: &str) -> Result<Vec<Tag>, AppError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return self.find_all().await;
        }

        let pattern = format!("%{}%", escape_like(fragment));
        let tags = sqlx::query_as::<Postgres, Tag>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM tags
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select", db.record_id = id))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            "SELECT id, name, created_at, updated_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Delete a tag. Returns false when no tag had this id.
    ///
    /// Associations referencing the tag go with it (`ON DELETE CASCADE`).
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "delete", db.record_id = id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escape `LIKE` metacharacters so the fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
