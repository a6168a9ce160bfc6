//! Student participation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::ValidationError;
use crate::utils::helpers::{mean, percentage};
use crate::utils::validation::check_range;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// One student's engagement with one activity.
///
/// The activity and student references are fixed at construction. The
/// participation date is stamped the first time `participated` becomes true
/// and is never overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participation {
    id: Option<i64>,
    activity_id: i64,
    student_id: i64,
    participated: bool,
    score: Option<f64>,
    pub feedback: Option<String>,
    participation_date: Option<DateTime<Utc>>,
}

impl Participation {
    pub fn new(activity_id: i64, student_id: i64) -> Self {
        Self {
            id: None,
            activity_id,
            student_id,
            participated: false,
            score: None,
            feedback: None,
            participation_date: None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn activity_id(&self) -> i64 {
        self.activity_id
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn participated(&self) -> bool {
        self.participated
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn participation_date(&self) -> Option<DateTime<Utc>> {
        self.participation_date
    }

    pub fn set_participated(&mut self, participated: bool) {
        self.participated = participated;
        if participated && self.participation_date.is_none() {
            self.participation_date = Some(Utc::now());
        }
    }

    /// Set or clear the score; values outside [0, 100] are rejected
    pub fn set_score(&mut self, score: Option<f64>) -> Result<(), ValidationError> {
        if let Some(value) = score {
            check_range("score", value, MIN_SCORE, MAX_SCORE)?;
        }
        self.score = score;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.score {
            Some(value) => check_range("score", value, MIN_SCORE, MAX_SCORE),
            None => Ok(()),
        }
    }
}

/// Participating records over all records, as a percentage
pub fn participation_rate(records: &[Participation]) -> f64 {
    let participating = records.iter().filter(|p| p.participated).count();
    percentage(participating, records.len())
}

/// Mean of every non-null score, whether or not the student participated
pub fn average_score(records: &[Participation]) -> f64 {
    mean(records.iter().filter_map(|p| p.score))
}
