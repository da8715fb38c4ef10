//! Object name generation shared by all backends.

use std::path::Path;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

/// Generate a fresh object name for an upload: `{uuid}{.ext}`.
///
/// The extension is taken from `original_filename`, lower-cased, and kept only
/// when it is short and alphanumeric. Otherwise the name is a bare UUID.
pub fn generate_object_name(original_filename: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_filename) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
