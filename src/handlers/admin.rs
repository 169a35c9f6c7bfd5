// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::RecapEntry,
        material::{CreateMaterialRequest, Material, UpdateMaterialRequest},
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        user::User,
    },
    utils::html::clean_html,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, password, role, created_at FROM users ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Lists all materials with every tier variant, for the management table.
/// Admin only.
pub async fn list_materials(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let materials =
        sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY position ASC")
            .fetch_all(&pool)
            .await?;

    Ok(Json(materials))
}

/// Creates a new material.
/// Admin only. Content fields are sanitized before storage.
pub async fn create_material(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO materials
        (position, title, content_hard, video_hard, content_medium, video_medium,
         content_easy, video_easy, file_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(payload.position)
    .bind(&payload.title)
    .bind(clean_html(&payload.content_hard))
    .bind(&payload.video_hard)
    .bind(clean_html(&payload.content_medium))
    .bind(&payload.video_medium)
    .bind(clean_html(&payload.content_easy))
    .bind(&payload.video_easy)
    .bind(&payload.file_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Position {} is already taken", payload.position))
        } else {
            tracing::error!("Failed to create material: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a material by ID.
/// Admin only.
pub async fn update_material(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.position.is_none()
        && payload.title.is_none()
        && payload.content_hard.is_none()
        && payload.video_hard.is_none()
        && payload.content_medium.is_none()
        && payload.video_medium.is_none()
        && payload.content_easy.is_none()
        && payload.video_easy.is_none()
        && payload.file_url.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE materials SET ");
    let mut separated = builder.separated(", ");

    if let Some(position) = payload.position {
        separated.push("position = ");
        separated.push_bind_unseparated(position);
    }

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(content_hard) = payload.content_hard {
        separated.push("content_hard = ");
        separated.push_bind_unseparated(clean_html(&content_hard));
    }

    if let Some(video_hard) = payload.video_hard {
        separated.push("video_hard = ");
        separated.push_bind_unseparated(video_hard);
    }

    if let Some(content_medium) = payload.content_medium {
        separated.push("content_medium = ");
        separated.push_bind_unseparated(clean_html(&content_medium));
    }

    if let Some(video_medium) = payload.video_medium {
        separated.push("video_medium = ");
        separated.push_bind_unseparated(video_medium);
    }

    if let Some(content_easy) = payload.content_easy {
        separated.push("content_easy = ");
        separated.push_bind_unseparated(clean_html(&content_easy));
    }

    if let Some(video_easy) = payload.video_easy {
        separated.push("video_easy = ");
        separated.push_bind_unseparated(video_easy);
    }

    if let Some(file_url) = payload.file_url {
        separated.push("file_url = ");
        separated.push_bind_unseparated(file_url);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Position is already taken".to_string())
        } else {
            tracing::error!("Failed to update material: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Material not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a material by ID. Its questions cascade away with it.
/// Admin only.
pub async fn delete_material(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM materials WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete material: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Material not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub material_id: Option<i64>,
}

/// Lists questions, optionally filtered by material.
/// Admin only (includes answer keys).
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT *
        FROM questions
        WHERE ($1::BIGINT IS NULL OR material_id = $1)
        ORDER BY id ASC
        "#,
    )
    .bind(params.material_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}

/// Creates a new question.
/// Admin only. The answer key must be one of the options.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.options.contains(&payload.correct_answer) {
        return Err(AppError::BadRequest(
            "correct_answer must match one of the options".to_string(),
        ));
    }

    let material_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM materials WHERE id = $1")
        .bind(payload.material_id)
        .fetch_optional(&pool)
        .await?;

    if material_exists.is_none() {
        return Err(AppError::NotFound("Material not found".to_string()));
    }

    let options_json = serde_json::to_value(&payload.options).unwrap_or_default();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions
        (material_id, question, options, correct_answer, wrong_feedback, difficulty)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(payload.material_id)
    .bind(&payload.question)
    .bind(options_json)
    .bind(&payload.correct_answer)
    .bind(&payload.wrong_feedback)
    .bind(&payload.difficulty)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a question by ID.
/// Admin only. Keeps the answer key consistent with the options.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.question.is_none()
        && payload.options.is_none()
        && payload.correct_answer.is_none()
        && payload.wrong_feedback.is_none()
        && payload.difficulty.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let existing = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    // Validate the resulting (options, answer key) pair, whichever side changed.
    let final_options = payload.options.as_ref().unwrap_or(&existing.options.0);
    let final_answer = payload
        .correct_answer
        .as_ref()
        .unwrap_or(&existing.correct_answer);

    if !final_options.contains(final_answer) {
        return Err(AppError::BadRequest(
            "correct_answer must match one of the options".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(question) = payload.question {
        separated.push("question = ");
        separated.push_bind_unseparated(question);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(serde_json::to_value(options).unwrap_or_default());
    }

    if let Some(correct_answer) = payload.correct_answer {
        separated.push("correct_answer = ");
        separated.push_bind_unseparated(correct_answer);
    }

    if let Some(wrong_feedback) = payload.wrong_feedback {
        separated.push("wrong_feedback = ");
        separated.push_bind_unseparated(wrong_feedback);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Retrieves the full attempt history, newest first, for the score recap.
/// A deleted material leaves its rows with a null title.
/// Admin only.
pub async fn attempt_history(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let entries = sqlx::query_as::<_, RecapEntry>(
        r#"
        SELECT
            h.id,
            h.user_email,
            m.title AS material_title,
            h.score,
            h.status,
            h.created_at
        FROM attempt_history h
        LEFT JOIN materials m ON h.material_id = m.id
        ORDER BY h.created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempt history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(entries))
}
