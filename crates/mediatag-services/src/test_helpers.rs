//! In-memory `Storage` and `MediaStore` doubles for service tests.

use async_trait::async_trait;
use bytes::Bytes;
use mediatag_core::models::{MediaDraft, MediaWithTags};
use mediatag_db::{MediaStore, MediaStoreError, TagAssociationError};
use mediatag_storage::{Storage, StorageBackend, StorageError, StorageResult, StoredObject};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of collaborator calls, shared by both doubles.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: &str) {
        self.0.lock().unwrap().push(call.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct InMemoryStorage {
    log: CallLog,
    objects: Mutex<Vec<StoredObject>>,
    next_key: Mutex<u64>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    upload_delay: Mutex<Option<Duration>>,
}

impl InMemoryStorage {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            objects: Mutex::new(Vec::new()),
            next_key: Mutex::new(0),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            upload_delay: Mutex::new(None),
        }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn upload(
        &self,
        data: Bytes,
        original_filename: &str,
        _content_type: &str,
    ) -> StorageResult<StoredObject> {
        self.log.push("upload");

        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("connection refused".to_string()));
        }

        let key = {
            let mut next = self.next_key.lock().unwrap();
            *next += 1;
            format!("object-{}-{}", next, original_filename)
        };
        let stored = StoredObject {
            url: format!("http://storage.test/media/{}", key),
            key,
            size_bytes: data.len() as u64,
        };
        self.objects.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.log.push("delete");
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("access denied".to_string()));
        }
        self.objects.lock().unwrap().retain(|o| o.key != storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .any(|o| o.key == storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[derive(Default)]
struct MediaState {
    tags: BTreeMap<i64, String>,
    media: BTreeMap<i64, MediaDraft>,
    associations: BTreeSet<(i64, i64)>,
    next_id: i64,
}

/// Mirrors the Postgres store: unique names, reservation row first, then an
/// all-or-nothing association step.
pub struct InMemoryMediaStore {
    log: CallLog,
    state: Mutex<MediaState>,
    next_create_error: Mutex<Option<MediaStoreError>>,
}

impl InMemoryMediaStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Mutex::new(MediaState::default()),
            next_create_error: Mutex::new(None),
        }
    }

    pub fn add_tag(&self, id: i64, name: &str) {
        self.state.lock().unwrap().tags.insert(id, name.to_string());
    }

    pub fn fail_next_create(&self, err: MediaStoreError) {
        *self.next_create_error.lock().unwrap() = Some(err);
    }

    pub fn tag_ids_of(&self, media_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .associations
            .iter()
            .filter(|(m, _)| *m == media_id)
            .map(|(_, t)| *t)
            .collect()
    }

    fn project(state: &MediaState, id: i64, draft: &MediaDraft) -> MediaWithTags {
        let tag_names: BTreeSet<String> = state
            .associations
            .iter()
            .filter(|(m, _)| *m == id)
            .filter_map(|(_, t)| state.tags.get(t).cloned())
            .collect();
        MediaWithTags {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            file_url: draft.file_url.clone(),
            tag_names: tag_names.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn name_exists(&self, name: &str) -> Result<bool, MediaStoreError> {
        self.log.push("name_exists");
        Ok(self
            .state
            .lock()
            .unwrap()
            .media
            .values()
            .any(|m| m.name == name))
    }

    async fn create_with_tags(
        &self,
        draft: MediaDraft,
        tag_ids: &[i64],
    ) -> Result<i64, MediaStoreError> {
        self.log.push("create_with_tags");
        if let Some(err) = self.next_create_error.lock().unwrap().take() {
            return Err(err);
        }

        let mut state = self.state.lock().unwrap();
        if state.media.values().any(|m| m.name == draft.name) {
            return Err(MediaStoreError::AlreadyExists(draft.name));
        }

        state.next_id += 1;
        let media_id = state.next_id;
        state.media.insert(media_id, draft);

        let requested: BTreeSet<i64> = tag_ids.iter().copied().collect();
        let found = requested
            .iter()
            .filter(|id| state.tags.contains_key(id))
            .count();
        if found != requested.len() {
            return Err(MediaStoreError::DbOperation {
                media_id,
                source: TagAssociationError::MissingTags {
                    requested: requested.len(),
                    found,
                },
            });
        }

        for tag_id in requested {
            state.associations.insert((media_id, tag_id));
        }
        Ok(media_id)
    }

    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<MediaWithTags>, MediaStoreError> {
        self.log.push("find_by_tag");
        let state = self.state.lock().unwrap();
        Ok(state
            .media
            .iter()
            .filter(|(id, _)| state.associations.contains(&(**id, tag_id)))
            .map(|(id, draft)| Self::project(&state, *id, draft))
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<MediaWithTags>, MediaStoreError> {
        self.log.push("find_all");
        let state = self.state.lock().unwrap();
        Ok(state
            .media
            .iter()
            .map(|(id, draft)| Self::project(&state, *id, draft))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<MediaWithTags>, MediaStoreError> {
        self.log.push("find_by_id");
        let state = self.state.lock().unwrap();
        Ok(state
            .media
            .get(&id)
            .map(|draft| Self::project(&state, id, draft)))
    }
}
