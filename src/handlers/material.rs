// src/handlers/material.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    adaptive::Tier,
    error::AppError,
    models::material::{Material, MaterialSummary, MaterialView},
    utils::jwt::Claims,
};

/// Helper struct for the dashboard listing.
#[derive(sqlx::FromRow)]
struct MaterialHead {
    id: i64,
    position: i64,
    title: String,
}

/// Stored attempt count for a (user, material) pair; 0 when no progress row exists.
pub(crate) async fn fetch_attempts(
    pool: &PgPool,
    user_id: i64,
    material_id: i64,
) -> Result<i64, AppError> {
    let attempts = sqlx::query_scalar::<_, i64>(
        "SELECT attempts FROM progress WHERE user_id = $1 AND material_id = $2",
    )
    .bind(user_id)
    .bind(material_id)
    .fetch_optional(pool)
    .await?;

    Ok(attempts.unwrap_or(0))
}

/// Enforces the sequential unlock gate.
///
/// The first material (lowest position) is always reachable. Any other
/// material requires a 'lulus' progress status on the material directly
/// before it. Returns 403 when the gate is shut.
pub(crate) async fn ensure_unlocked(
    pool: &PgPool,
    user_id: i64,
    material: &Material,
) -> Result<(), AppError> {
    let previous_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM materials WHERE position < $1 ORDER BY position DESC LIMIT 1",
    )
    .bind(material.position)
    .fetch_optional(pool)
    .await?;

    let Some(previous_id) = previous_id else {
        return Ok(());
    };

    let previous_status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM progress WHERE user_id = $1 AND material_id = $2",
    )
    .bind(user_id)
    .bind(previous_id)
    .fetch_optional(pool)
    .await?;

    if previous_status.as_deref() != Some("lulus") {
        return Err(AppError::Forbidden(
            "Material is locked. Pass the previous material first.".to_string(),
        ));
    }

    Ok(())
}

/// Lists all materials for the dashboard, in sequential order, each joined
/// with the caller's progress status and lock state.
pub async fn list_materials(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let materials = sqlx::query_as::<_, MaterialHead>(
        "SELECT id, position, title FROM materials ORDER BY position ASC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list materials: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let progress: Vec<(i64, String)> =
        sqlx::query_as("SELECT material_id, status FROM progress WHERE user_id = $1")
            .bind(claims.user_id())
            .fetch_all(&pool)
            .await?;

    let status_by_material: std::collections::HashMap<i64, String> =
        progress.into_iter().collect();

    let mut summaries = Vec::with_capacity(materials.len());
    let mut previous_passed = true;

    for head in materials {
        let status = status_by_material.get(&head.id).cloned();

        summaries.push(MaterialSummary {
            id: head.id,
            position: head.position,
            title: head.title,
            locked: !previous_passed,
            status: status.clone(),
        });

        previous_passed = status.as_deref() == Some("lulus");
    }

    Ok(Json(summaries))
}

/// Retrieves one material as the tier-matched study view.
///
/// The caller's attempt count selects which content/video variant is
/// served; the unlock gate is enforced before anything is returned.
pub async fn get_material(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Material not found".to_string()))?;

    let user_id = claims.user_id();
    ensure_unlocked(&pool, user_id, &material).await?;

    let attempts = fetch_attempts(&pool, user_id, material.id).await?;
    let tier = Tier::for_attempts(attempts);
    let (content, video) = material.variant(tier);

    Ok(Json(MaterialView {
        id: material.id,
        title: material.title.clone(),
        tier,
        content: content.to_string(),
        video: video.map(|v| v.to_string()),
        file_url: material.file_url.clone(),
    }))
}
