// src/models/progress.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'progress' table in the database.
/// One row per (user, material), overwritten on every submission.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Progress {
    pub id: i64,
    pub user_id: i64,
    pub material_id: i64,
    pub score: i64,

    /// 'lulus' (passed) or 'mengulang' (repeat).
    pub status: String,

    /// Attempt counter, also encodes the tier served next.
    pub attempts: i64,

    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row of the student progress report, joined with the material title.
#[derive(Debug, Serialize, FromRow)]
pub struct ProgressReportEntry {
    pub material_id: i64,
    pub title: String,
    pub score: i64,
    pub status: String,
    pub attempts: i64,
}
