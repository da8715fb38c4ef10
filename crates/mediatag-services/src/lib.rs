//! Mediatag Services
//!
//! The cataloging service: upload a file, record it once per name, attach its
//! tags, and answer tag-filtered queries.

pub mod catalog;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use catalog::{CatalogConfig, CatalogService, CatalogUpload, UploadedFile};
