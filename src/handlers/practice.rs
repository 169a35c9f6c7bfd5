// src/handlers/practice.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres};

use crate::{
    adaptive::{self, Tier},
    error::AppError,
    models::{
        attempt::{CheckAnswerRequest, PracticeResult, QuestionFeedback, SubmitPracticeRequest},
        material::Material,
        question::{PublicQuestion, Question},
    },
    utils::jwt::Claims,
};

use super::material::{ensure_unlocked, fetch_attempts};

/// Helper struct for fetching answer keys from the database.
#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    correct_answer: String,
    wrong_feedback: Option<String>,
}

/// Fetches a material and enforces the unlock gate for the caller.
async fn fetch_gated_material(
    pool: &PgPool,
    claims: &Claims,
    material_id: i64,
) -> Result<Material, AppError> {
    let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
        .bind(material_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Material not found".to_string()))?;

    ensure_unlocked(pool, claims.user_id(), &material).await?;

    Ok(material)
}

/// Serves the practice set for a material at the caller's current tier.
///
/// Questions tagged with the tier are returned shuffled and with the answer
/// key stripped. When no question carries the tag, the whole question bank
/// of the material is served instead.
pub async fn get_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let material = fetch_gated_material(&pool, &claims, id).await?;

    let attempts = fetch_attempts(&pool, claims.user_id(), material.id).await?;
    let tier = Tier::for_attempts(attempts);

    let mut questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT *
        FROM questions
        WHERE material_id = $1 AND difficulty = $2
        ORDER BY RANDOM()
        "#,
    )
    .bind(material.id)
    .bind(tier.as_str())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch practice questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Tier fallback: an untagged bank still yields a quiz.
    if questions.is_empty() {
        questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE material_id = $1 ORDER BY RANDOM()",
        )
        .bind(material.id)
        .fetch_all(&pool)
        .await?;
    }

    let public: Vec<PublicQuestion> = questions
        .into_iter()
        .map(|q| PublicQuestion {
            id: q.id,
            question: q.question,
            options: q.options,
        })
        .collect();

    Ok(Json(json!({
        "material_id": material.id,
        "tier": tier,
        "questions": public
    })))
}

/// Checks a single answer mid-run and returns the feedback the student
/// sees before moving to the next question.
pub async fn check_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<CheckAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    // The question's material must be reachable for this caller.
    fetch_gated_material(&pool, &claims, question.material_id).await?;

    let correct = req.answer == question.correct_answer;

    Ok(Json(json!({
        "question_id": question.id,
        "correct": correct,
        "correct_answer": question.correct_answer,
        "wrong_feedback": if correct { None } else { question.wrong_feedback },
    })))
}

/// Grades a full practice run and stores the result.
///
/// Correctness is decided server-side against the stored answer keys. The
/// progress upsert and the history insert commit in a single transaction,
/// so a submission is either fully recorded or not at all.
pub async fn submit_practice(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitPracticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let material = fetch_gated_material(&pool, &claims, id).await?;

    let question_ids: Vec<i64> = req.answers.keys().cloned().collect();

    if question_ids.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder = sqlx::QueryBuilder::<Postgres>::new(
        "SELECT id, correct_answer, wrong_feedback FROM questions WHERE material_id = ",
    );
    query_builder.push_bind(material.id);
    query_builder.push(" AND id IN (");

    let mut separated = query_builder.separated(",");
    for qid in &question_ids {
        separated.push_bind(qid);
    }
    separated.push_unseparated(")");

    let answer_keys: Vec<AnswerKey> = query_builder
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if answer_keys.is_empty() {
        return Err(AppError::BadRequest(
            "Answers do not match any question of this material".to_string(),
        ));
    }

    let mut correct_count = 0;
    let mut feedback = Vec::with_capacity(answer_keys.len());

    for key in &answer_keys {
        let correct = req.answers.get(&key.id).is_some_and(|a| *a == key.correct_answer);
        if correct {
            correct_count += 1;
        }
        feedback.push(QuestionFeedback {
            question_id: key.id,
            correct,
            wrong_feedback: if correct {
                None
            } else {
                key.wrong_feedback.clone()
            },
        });
    }

    let total_questions = answer_keys.len();
    let score = adaptive::score(correct_count, total_questions);

    let user_id = claims.user_id();
    let attempts = fetch_attempts(&pool, user_id, material.id).await?;
    let outcome = adaptive::transition(attempts, score);

    // Progress upsert and history insert commit together.
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO progress (user_id, material_id, score, status, attempts, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (user_id, material_id) DO UPDATE SET
            score = EXCLUDED.score,
            status = EXCLUDED.status,
            attempts = EXCLUDED.attempts,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(material.id)
    .bind(score)
    .bind(outcome.status.as_str())
    .bind(outcome.attempts)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert progress: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    sqlx::query(
        r#"
        INSERT INTO attempt_history (user_id, user_email, material_id, score, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(&claims.email)
    .bind(material.id)
    .bind(score)
    .bind(outcome.status.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert attempt history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    Ok(Json(PracticeResult {
        score,
        status: outcome.status.as_str().to_string(),
        correct_count,
        total_questions,
        next_tier: Tier::for_attempts(outcome.attempts),
        feedback,
    }))
}
