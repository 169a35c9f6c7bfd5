// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::adaptive::Tier;

/// Represents the 'attempt_history' table in the database.
/// Append-only: one row per submission, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub user_id: i64,

    /// Denormalized so the admin recap stays readable after user deletion.
    pub user_email: String,

    pub material_id: i64,
    pub score: i64,
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Admin recap row, joined with the material title when it still exists.
#[derive(Debug, Serialize, FromRow)]
pub struct RecapEntry {
    pub id: i64,
    pub user_email: String,
    pub material_title: Option<String>,
    pub score: i64,
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a practice run.
#[derive(Debug, Deserialize)]
pub struct SubmitPracticeRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: text of the selected option
    pub answers: HashMap<i64, String>,
}

/// DTO for checking a single answer mid-run.
#[derive(Debug, Deserialize)]
pub struct CheckAnswerRequest {
    pub answer: String,
}

/// Per-question grading detail returned after a submission.
#[derive(Debug, Serialize)]
pub struct QuestionFeedback {
    pub question_id: i64,
    pub correct: bool,
    /// Explanation, present only for wrong answers.
    pub wrong_feedback: Option<String>,
}

/// DTO returned after grading a practice run.
#[derive(Debug, Serialize)]
pub struct PracticeResult {
    pub score: i64,
    pub status: String,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Tier that will be served on the next run.
    pub next_tier: Tier,
    pub feedback: Vec<QuestionFeedback>,
}
