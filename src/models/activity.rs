//! Activity model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::participation::{self, Participation};
use crate::utils::errors::ValidationError;
use crate::utils::validation::require_text;

/// A schedulable educational unit together with the participations it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Activity {
    id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    created_at: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub status: ActivityStatus,
    pub activity_type: ActivityType,
    pub professor: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub participations: Vec<Participation>,
}

impl Activity {
    pub fn new(title: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            created_at: Utc::now(),
            deadline: None,
            status: ActivityStatus::Planned,
            activity_type,
            professor: None,
            participations: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }

    /// Percentage of owned participations marked as participated
    pub fn participation_rate(&self) -> f64 {
        participation::participation_rate(&self.participations)
    }

    /// Mean over every scored participation, participated or not
    pub fn average_score(&self) -> f64 {
        participation::average_score(&self.participations)
    }

    pub fn participating_count(&self) -> usize {
        self.participations.iter().filter(|p| p.participated()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 4] = [
        ActivityStatus::Planned,
        ActivityStatus::InProgress,
        ActivityStatus::Completed,
        ActivityStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityStatus::Planned => "Planned",
            ActivityStatus::InProgress => "In progress",
            ActivityStatus::Completed => "Completed",
            ActivityStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Lecture,
    Assignment,
    Project,
    Quiz,
    Discussion,
    Practical,
    Seminar,
    Workshop,
    Exam,
}

impl ActivityType {
    pub const ALL: [ActivityType; 9] = [
        ActivityType::Lecture,
        ActivityType::Assignment,
        ActivityType::Project,
        ActivityType::Quiz,
        ActivityType::Discussion,
        ActivityType::Practical,
        ActivityType::Seminar,
        ActivityType::Workshop,
        ActivityType::Exam,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Lecture => "Lecture",
            ActivityType::Assignment => "Assignment",
            ActivityType::Project => "Project",
            ActivityType::Quiz => "Quiz",
            ActivityType::Discussion => "Discussion",
            ActivityType::Practical => "Practical work",
            ActivityType::Seminar => "Seminar",
            ActivityType::Workshop => "Workshop",
            ActivityType::Exam => "Exam",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Criteria for `ActivityRepository::advanced_search`; all set fields are AND-combined
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySearch {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    pub status: Option<ActivityStatus>,
    pub activity_type: Option<ActivityType>,
    /// Case-insensitive substring of the professor name
    pub professor: Option<String>,
}
