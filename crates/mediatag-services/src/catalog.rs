//! Cataloging service
//!
//! Write path: validate → check name → upload → create record + tag associations.
//! The upload always happens before any database write because the record
//! needs the object URL. If the record cannot be created, the uploaded object
//! is compensated according to [`OrphanPolicy`].

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mediatag_core::models::{
    MediaDraft, MediaWithTags, MEDIA_DESCRIPTION_MAX_LEN, MEDIA_NAME_MAX_LEN,
};
use mediatag_core::{AppError, CatalogSettings, OrphanPolicy};
use mediatag_db::{MediaStore, MediaStoreError};
use mediatag_storage::{Storage, StoredObject};

/// File content received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Bytes,
    pub original_filename: String,
    pub content_type: String,
}

/// One cataloging request, as received (not yet validated).
#[derive(Debug, Clone)]
pub struct CatalogUpload {
    pub name: String,
    pub description: Option<String>,
    pub tag_ids: Vec<i64>,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub max_file_size_bytes: usize,
    /// Upper bound on each I/O step (name check, upload, record creation, queries)
    pub operation_timeout: Duration,
    pub orphan_policy: OrphanPolicy,
}

impl From<&CatalogSettings> for CatalogConfig {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            max_file_size_bytes: settings.max_file_size_bytes,
            operation_timeout: settings.operation_timeout(),
            orphan_policy: settings.orphan_policy,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::from(&CatalogSettings::default())
    }
}

/// Request after validation: trimmed name, normalized description, distinct tag ids.
#[derive(Debug)]
struct ValidatedUpload {
    name: String,
    description: Option<String>,
    tag_ids: Vec<i64>,
    file: UploadedFile,
}

fn validate_upload(
    request: CatalogUpload,
    config: &CatalogConfig,
) -> Result<ValidatedUpload, AppError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Media name is required".to_string()));
    }
    if name.chars().count() > MEDIA_NAME_MAX_LEN {
        return Err(AppError::InvalidInput(format!(
            "Media name must be at most {} characters",
            MEDIA_NAME_MAX_LEN
        )));
    }

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if let Some(ref d) = description {
        if d.chars().count() > MEDIA_DESCRIPTION_MAX_LEN {
            return Err(AppError::InvalidInput(format!(
                "Description must be at most {} characters",
                MEDIA_DESCRIPTION_MAX_LEN
            )));
        }
    }

    if request.tag_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one tag is required".to_string(),
        ));
    }
    if let Some(bad) = request.tag_ids.iter().find(|id| **id <= 0) {
        return Err(AppError::InvalidInput(format!("Invalid tag id: {}", bad)));
    }
    let tag_ids: Vec<i64> = request
        .tag_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if request.file.data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    if request.file.data.len() > config.max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File size {} bytes exceeds maximum of {} bytes",
            request.file.data.len(),
            config.max_file_size_bytes
        )));
    }

    Ok(ValidatedUpload {
        name,
        description,
        tag_ids,
        file: request.file,
    })
}

/// Orchestrates the object store and the media store.
///
/// Both collaborators are injected already constructed; the service never
/// reads process configuration.
#[derive(Clone)]
pub struct CatalogService {
    storage: Arc<dyn Storage>,
    media: Arc<dyn MediaStore>,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(storage: Arc<dyn Storage>, media: Arc<dyn MediaStore>, config: CatalogConfig) -> Self {
        Self {
            storage,
            media,
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Upload the file and catalog it under `name` with the given tags.
    ///
    /// Returns the new media id. A name that is already catalogued is a
    /// `Conflict`; tags that do not exist are `UnknownTags`.
    #[tracing::instrument(
        skip(self, request),
        fields(
            media.name = %request.name,
            file.size_bytes = request.file.data.len(),
            tag_count = request.tag_ids.len()
        )
    )]
    pub async fn upload_and_catalog(&self, request: CatalogUpload) -> Result<i64, AppError> {
        let upload = validate_upload(request, &self.config)?;

        // Skips the upload for the common duplicate case; create_with_tags
        // still decides under concurrency.
        if self
            .bounded("media name check", self.media.name_exists(&upload.name))
            .await??
        {
            return Err(MediaStoreError::AlreadyExists(upload.name).into());
        }

        let uploaded = self
            .bounded(
                "object upload",
                self.storage.upload(
                    upload.file.data.clone(),
                    &upload.file.original_filename,
                    &upload.file.content_type,
                ),
            )
            .await;
        let stored = match uploaded {
            Ok(result) => result?,
            Err(timeout) => {
                // The backend picks the key, so it is unknown here.
                tracing::warn!(
                    original_filename = %upload.file.original_filename,
                    size_bytes = upload.file.data.len(),
                    "Object upload timed out, it may still complete and leave a possible orphan"
                );
                return Err(timeout);
            }
        };

        let draft = MediaDraft {
            name: upload.name,
            description: upload.description,
            file_url: stored.url.clone(),
            file_size: stored.size_bytes as i64,
        };

        let created = self
            .bounded(
                "media record creation",
                self.media.create_with_tags(draft, &upload.tag_ids),
            )
            .await;

        match created {
            Ok(Ok(media_id)) => {
                tracing::info!(media_id, key = %stored.key, "Upload catalogued");
                Ok(media_id)
            }
            // The media row exists and references the object; only its tags were rolled back.
            Ok(Err(err @ MediaStoreError::DbOperation { .. })) => Err(err.into()),
            Ok(Err(err)) => {
                self.handle_orphan(&stored).await;
                Err(err.into())
            }
            Err(timeout) => {
                // The row may or may not have been committed, so the object stays.
                tracing::warn!(
                    key = %stored.key,
                    url = %stored.url,
                    "Record creation timed out, uploaded object kept"
                );
                Err(timeout)
            }
        }
    }

    /// Media associated with `tag_id`, or every media when no tag is given.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_tag(&self, tag_id: Option<i64>) -> Result<Vec<MediaWithTags>, AppError> {
        let media = match tag_id {
            Some(id) => self.bounded("media query", self.media.find_by_tag(id)).await??,
            None => self.bounded("media query", self.media.find_all()).await??,
        };
        Ok(media)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_media(&self, id: i64) -> Result<MediaWithTags, AppError> {
        self.bounded("media lookup", self.media.find_by_id(id))
            .await??
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))
    }

    async fn bounded<F: Future>(&self, step: &'static str, fut: F) -> Result<F::Output, AppError> {
        tokio::time::timeout(self.config.operation_timeout, fut)
            .await
            .map_err(|_| {
                tracing::warn!(
                    step,
                    timeout_ms = self.config.operation_timeout.as_millis() as u64,
                    "Catalog step timed out"
                );
                AppError::Timeout(format!(
                    "{} did not complete within {:?}",
                    step, self.config.operation_timeout
                ))
            })
    }

    /// Deal with an uploaded object no record points at. Never fails.
    async fn handle_orphan(&self, stored: &StoredObject) {
        match self.config.orphan_policy {
            OrphanPolicy::Keep => {
                tracing::warn!(
                    key = %stored.key,
                    url = %stored.url,
                    "Record creation failed, orphaned object kept"
                );
            }
            OrphanPolicy::Delete => {
                match self
                    .bounded("orphan cleanup", self.storage.delete(&stored.key))
                    .await
                {
                    Ok(Ok(())) => {
                        tracing::info!(key = %stored.key, "Orphaned object deleted");
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            error = %e,
                            key = %stored.key,
                            url = %stored.url,
                            "Failed to delete orphaned object"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            key = %stored.key,
                            url = %stored.url,
                            "Failed to delete orphaned object"
                        );
                    }
                }
            }
        }
    }
}
