// src/adaptive.rs

//! Difficulty progression rules for practice runs.
//!
//! The stored attempt counter doubles as the tier indicator: 0 serves the
//! Hard set, 1 the Medium set, 2 or more the Low set. All scoring and tier
//! transitions go through this module; handlers never branch on attempt
//! counts themselves.

use serde::{Deserialize, Serialize};

use crate::config::PASSING_SCORE;

/// Difficulty tier of a practice run and its matching material variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Hard,
    Medium,
    Low,
}

impl Tier {
    /// Tier served for a given stored attempt count.
    pub fn for_attempts(attempts: i64) -> Self {
        match attempts {
            0 => Tier::Hard,
            1 => Tier::Medium,
            _ => Tier::Low,
        }
    }

    /// Tag stored on the `difficulty` column of questions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hard => "Hard",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
        }
    }
}

/// Pass/repeat status stored on a progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Lulus,
    Mengulang,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Lulus => "lulus",
            ProgressStatus::Mengulang => "mengulang",
        }
    }
}

/// Next stored progress state after grading a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: ProgressStatus,
    pub attempts: i64,
}

/// Percentage score, rounded to the nearest integer. An empty run scores 0.
pub fn score(correct: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i64
}

pub fn is_passing(score: i64) -> bool {
    score >= PASSING_SCORE
}

/// Maps the stored attempt counter and a fresh score to the next stored
/// progress state.
///
/// Only a pass on the Hard tier completes a material. A pass on a lower
/// tier moves the student one tier up for the next run; a failure moves
/// one tier down (Low stays Low, its counter keeps growing).
pub fn transition(attempts: i64, score: i64) -> Outcome {
    let passed = is_passing(score);

    match (Tier::for_attempts(attempts), passed) {
        (Tier::Hard, true) => Outcome {
            status: ProgressStatus::Lulus,
            attempts,
        },
        (Tier::Hard, false) => Outcome {
            status: ProgressStatus::Mengulang,
            attempts: 1,
        },
        (Tier::Medium, true) => Outcome {
            status: ProgressStatus::Mengulang,
            attempts: 0,
        },
        (Tier::Medium, false) => Outcome {
            status: ProgressStatus::Mengulang,
            attempts: 2,
        },
        (Tier::Low, true) => Outcome {
            status: ProgressStatus::Mengulang,
            attempts: 1,
        },
        (Tier::Low, false) => Outcome {
            status: ProgressStatus::Mengulang,
            attempts: attempts + 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_attempts(0), Tier::Hard);
        assert_eq!(Tier::for_attempts(1), Tier::Medium);
        assert_eq!(Tier::for_attempts(2), Tier::Low);
        assert_eq!(Tier::for_attempts(7), Tier::Low);
    }

    #[test]
    fn test_score_rounding() {
        assert_eq!(score(7, 10), 70);
        assert_eq!(score(10, 10), 100);
        assert_eq!(score(0, 10), 0);
        // 2/3 = 66.66... rounds to 67
        assert_eq!(score(2, 3), 67);
        // 1/3 = 33.33... rounds to 33
        assert_eq!(score(1, 3), 33);
    }

    #[test]
    fn test_score_empty_run() {
        assert_eq!(score(0, 0), 0);
    }

    #[test]
    fn test_pass_threshold() {
        assert!(is_passing(70));
        assert!(is_passing(100));
        assert!(!is_passing(69));
    }

    #[test]
    fn test_hard_pass_completes() {
        let out = transition(0, 100);
        assert_eq!(out.status, ProgressStatus::Lulus);
        assert_eq!(out.attempts, 0);
    }

    #[test]
    fn test_hard_fail_drops_to_medium() {
        let out = transition(0, 40);
        assert_eq!(out.status, ProgressStatus::Mengulang);
        assert_eq!(out.attempts, 1);
        assert_eq!(Tier::for_attempts(out.attempts), Tier::Medium);
    }

    #[test]
    fn test_medium_pass_returns_to_hard() {
        let out = transition(1, 80);
        assert_eq!(out.status, ProgressStatus::Mengulang);
        assert_eq!(out.attempts, 0);
        assert_eq!(Tier::for_attempts(out.attempts), Tier::Hard);
    }

    #[test]
    fn test_medium_fail_drops_to_low() {
        let out = transition(1, 50);
        assert_eq!(out.status, ProgressStatus::Mengulang);
        assert_eq!(out.attempts, 2);
        assert_eq!(Tier::for_attempts(out.attempts), Tier::Low);
    }

    #[test]
    fn test_low_pass_climbs_to_medium() {
        let out = transition(2, 90);
        assert_eq!(out.status, ProgressStatus::Mengulang);
        assert_eq!(out.attempts, 1);
        assert_eq!(Tier::for_attempts(out.attempts), Tier::Medium);
    }

    #[test]
    fn test_low_fail_stays_low() {
        let out = transition(4, 10);
        assert_eq!(out.status, ProgressStatus::Mengulang);
        assert_eq!(out.attempts, 5);
        assert_eq!(Tier::for_attempts(out.attempts), Tier::Low);
    }

    #[test]
    fn test_exact_threshold_passes_on_every_tier() {
        assert_eq!(transition(0, 70).status, ProgressStatus::Lulus);
        assert_eq!(transition(1, 70).attempts, 0);
        assert_eq!(transition(3, 70).attempts, 1);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ProgressStatus::Lulus.as_str(), "lulus");
        assert_eq!(ProgressStatus::Mengulang.as_str(), "mengulang");
        assert_eq!(Tier::Hard.as_str(), "Hard");
        assert_eq!(Tier::Medium.as_str(), "Medium");
        assert_eq!(Tier::Low.as_str(), "Low");
    }
}
