//! Mediatag DB Library
//!
//! Postgres-backed Tag Store and Media Store.

pub mod db;

pub use db::{
    MediaRepository, MediaStore, MediaStoreError, TagAssociationError, TagRepository,
};
