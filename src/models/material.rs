// src/models/material.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::adaptive::Tier;

/// Represents the 'materials' table in the database.
///
/// Each material carries one content/video variant per difficulty tier.
/// `position` gives the sequential order used by the unlock gate.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub position: i64,
    pub title: String,
    pub content_hard: String,
    pub video_hard: Option<String>,
    pub content_medium: String,
    pub video_medium: Option<String>,
    pub content_easy: String,
    pub video_easy: Option<String>,

    /// Public URL of an optional downloadable file (slides, PDF).
    pub file_url: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Material {
    /// Content and video variant matching a difficulty tier.
    pub fn variant(&self, tier: Tier) -> (&str, Option<&str>) {
        match tier {
            Tier::Hard => (&self.content_hard, self.video_hard.as_deref()),
            Tier::Medium => (&self.content_medium, self.video_medium.as_deref()),
            Tier::Low => (&self.content_easy, self.video_easy.as_deref()),
        }
    }
}

/// Dashboard entry: material joined with the caller's progress and lock state.
#[derive(Debug, Serialize)]
pub struct MaterialSummary {
    pub id: i64,
    pub position: i64,
    pub title: String,
    /// 'lulus', 'mengulang', or null when the student has not attempted it.
    pub status: Option<String>,
    pub locked: bool,
}

/// Tier-matched study view of one material.
#[derive(Debug, Serialize)]
pub struct MaterialView {
    pub id: i64,
    pub title: String,
    pub tier: Tier,
    pub content: String,
    pub video: Option<String>,
    pub file_url: Option<String>,
}

/// DTO for creating a new material.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    pub position: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 50000))]
    pub content_hard: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_hard: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50000))]
    pub content_medium: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_medium: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50000))]
    pub content_easy: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_easy: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub file_url: Option<String>,
}

/// DTO for updating a material. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    pub position: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 50000))]
    pub content_hard: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_hard: Option<String>,
    #[validate(length(max = 50000))]
    pub content_medium: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_medium: Option<String>,
    #[validate(length(max = 50000))]
    pub content_easy: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub video_easy: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub file_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
/// Relative upload paths (e.g. "/uploads/xyz.pdf") are accepted as well.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if url.starts_with('/') {
        return Ok(());
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
