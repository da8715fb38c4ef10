//! Database repositories for data access layer
//!
//! `TagRepository` owns the tag catalog. `MediaRepository` owns media rows and
//! their tag associations, and is reached by the cataloging service through
//! the [`MediaStore`] trait.

mod error;
mod media;
mod tag;

pub use error::{MediaStoreError, TagAssociationError};
pub use media::{MediaRepository, MediaStore};
pub use tag::TagRepository;
