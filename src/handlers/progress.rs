// src/handlers/progress.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::progress::ProgressReportEntry, utils::jwt::Claims};

/// Lists the caller's progress per material, in sequential order.
pub async fn my_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let entries = sqlx::query_as::<_, ProgressReportEntry>(
        r#"
        SELECT p.material_id, m.title, p.score, p.status, p.attempts
        FROM progress p
        JOIN materials m ON p.material_id = m.id
        WHERE p.user_id = $1
        ORDER BY m.position ASC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch progress report: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(entries))
}
