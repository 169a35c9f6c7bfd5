// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Material this question belongs to.
    pub material_id: i64,

    /// The text content of the question.
    pub question: String,

    /// Ordered list of option texts (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Text of the correct option.
    pub correct_answer: String,

    /// Explanation shown when the question is answered wrong.
    pub wrong_feedback: Option<String>,

    /// Difficulty tag: 'Hard', 'Medium' or 'Low'.
    pub difficulty: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to students (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Json<Vec<String>>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub material_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(length(max = 2000))]
    pub wrong_feedback: Option<String>,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: Option<String>,
    #[validate(length(max = 2000))]
    pub wrong_feedback: Option<String>,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length"));
        }
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    match difficulty {
        "Hard" | "Medium" | "Low" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_difficulty")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_need_two_entries() {
        assert!(validate_options(&["only one".to_string()]).is_err());
        assert!(validate_options(&["a".to_string(), "b".to_string()]).is_ok());
    }

    #[test]
    fn test_empty_option_rejected() {
        assert!(validate_options(&["a".to_string(), "".to_string()]).is_err());
    }

    #[test]
    fn test_difficulty_tags() {
        assert!(validate_difficulty("Hard").is_ok());
        assert!(validate_difficulty("Medium").is_ok());
        assert!(validate_difficulty("Low").is_ok());
        assert!(validate_difficulty("hard").is_err());
        assert!(validate_difficulty("Expert").is_err());
    }
}
