// src/handlers/upload.rs

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{config::Config, error::AppError};

/// Receives one multipart file and stores it under the upload directory.
///
/// The stored name is the original filename made path-safe, prefixed with a
/// millisecond timestamp for uniqueness. Returns the public URL under
/// /uploads that gets saved on the material row.
/// Admin only.
pub async fn upload_file(
    State(config): State<Config>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        let safe_name: String = original_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stored_name = format!("{}_{}", chrono::Utc::now().timestamp_millis(), safe_name);

        let dir = std::path::PathBuf::from(&config.upload_dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tokio::fs::write(dir.join(&stored_name), &data)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        tracing::info!("Stored upload {} ({} bytes)", stored_name, data.len());

        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "file_url": format!("/uploads/{}", stored_name)
            })),
        ));
    }

    Err(AppError::BadRequest("No file field in upload".to_string()))
}
