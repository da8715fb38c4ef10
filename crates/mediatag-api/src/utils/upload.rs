//! Multipart parsing for the media upload endpoint.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use mediatag_core::AppError;
use mediatag_services::{CatalogUpload, UploadedFile};

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::InvalidInput(format!("{}: {}", context, err.body_text()))
    }
}

/// Parse the `tags` form value: a JSON array of tag ids such as `[1,2]`.
pub fn parse_tag_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    serde_json::from_str::<Vec<i64>>(raw.trim()).map_err(|_| {
        AppError::InvalidInput("tags must be a JSON array of tag ids, e.g. [1,2]".to_string())
    })
}

/// Read `name`, `tags`, optional `description` and exactly one `file` from the form.
///
/// Only shape is checked here; content rules (non-empty name, size limit, ...)
/// are enforced by the cataloging service.
pub async fn extract_catalog_upload(mut multipart: Multipart) -> Result<CatalogUpload, AppError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tag_ids: Option<Vec<i64>> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let original_filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?;

                file = Some(UploadedFile {
                    data,
                    original_filename,
                    content_type,
                });
            }
            "name" | "description" | "tags" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read form field", e))?;
                match field_name.as_str() {
                    "name" => name = Some(value),
                    "description" => description = Some(value),
                    _ => tag_ids = Some(parse_tag_ids(&value)?),
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let name = name.ok_or_else(|| AppError::InvalidInput("name is required".to_string()))?;
    let tag_ids = tag_ids.ok_or_else(|| AppError::InvalidInput("tags is required".to_string()))?;
    let file = file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(CatalogUpload {
        name,
        description,
        tag_ids,
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_ids() {
        assert_eq!(parse_tag_ids("[1,2]").unwrap(), vec![1, 2]);
        assert_eq!(parse_tag_ids(" [ 3 ] ").unwrap(), vec![3]);
        assert!(parse_tag_ids("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tag_ids_rejects_malformed() {
        for raw in ["1,2", "[\"a\"]", "", "{\"id\":1}", "[1.5]"] {
            assert!(
                matches!(parse_tag_ids(raw), Err(AppError::InvalidInput(_))),
                "{raw}"
            );
        }
    }
}
