//! Domain models for tags, media and their associations.

mod media;
mod tag;

pub use media::{
    CreateMediaResponse, Media, MediaDraft, MediaTagAssociation, MediaWithTags,
    MEDIA_DESCRIPTION_MAX_LEN, MEDIA_NAME_MAX_LEN,
};
pub use tag::{CreateTagRequest, CreateTagResponse, Tag, UpsertOutcome, TAG_NAME_MAX_LEN};
