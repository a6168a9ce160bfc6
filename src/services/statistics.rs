//! Statistics service implementation
//!
//! Aggregates are computed from entities read through the repositories. The
//! system-wide average only counts records marked as participated, unlike the
//! per-activity and per-student averages on the entities themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::database::{ActivityRepository, ParticipationRepository, StudentRepository};
use crate::models::{Activity, ActivityStatus, ActivityType, Participation, Student};
use crate::utils::errors::Result;
use crate::utils::helpers::{mean, percentage, round2};

/// Per-activity row of the participation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub activity_id: Option<i64>,
    pub title: String,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub participation_count: usize,
    pub participating_count: usize,
    pub participation_rate: f64,
    pub average_score: f64,
}

impl From<&Activity> for ActivityReport {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id(),
            title: activity.title.clone(),
            activity_type: activity.activity_type,
            status: activity.status,
            participation_count: activity.participations.len(),
            participating_count: activity.participating_count(),
            participation_rate: activity.participation_rate(),
            average_score: activity.average_score(),
        }
    }
}

/// Per-student row of the participation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    pub student_id: Option<i64>,
    pub registration_number: String,
    pub full_name: String,
    pub participation_count: usize,
    pub participation_rate: f64,
    pub average_score: f64,
}

impl From<&Student> for StudentReport {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.id(),
            registration_number: student.registration_number.clone(),
            full_name: student.full_name(),
            participation_count: student.participation_count(),
            participation_rate: student.participation_rate(),
            average_score: student.average_score(),
        }
    }
}

/// System-wide figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_activities: usize,
    pub total_students: usize,
    pub total_participations: usize,
    pub overall_participation_rate: f64,
    pub overall_average_score: f64,
    pub activities_by_status: BTreeMap<String, usize>,
    pub activities_by_type: BTreeMap<String, usize>,
}

impl fmt::Display for StatisticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total activities: {}", self.total_activities)?;
        writeln!(f, "Total students: {}", self.total_students)?;
        writeln!(f, "Overall participation rate: {:.2}%", self.overall_participation_rate)?;
        writeln!(f, "Overall average score: {:.2}/100", self.overall_average_score)?;
        writeln!(f, "Activities by status:")?;
        for (label, count) in &self.activities_by_status {
            writeln!(f, "  - {}: {}", label, count)?;
        }
        writeln!(f, "Activities by type:")?;
        for (label, count) in &self.activities_by_type {
            writeln!(f, "  - {}: {}", label, count)?;
        }
        Ok(())
    }
}

/// Participated records over all records, as a percentage; 0 without records
pub fn overall_participation_rate(records: &[Participation]) -> f64 {
    let participated = records.iter().filter(|p| p.participated()).count();
    percentage(participated, records.len())
}

/// Mean score over records that are both participated and scored
pub fn overall_average_score(records: &[Participation]) -> f64 {
    mean(
        records
            .iter()
            .filter(|p| p.participated())
            .filter_map(Participation::score),
    )
}

/// Type label to count, in one pass over `activities`
pub fn counts_by_type(activities: &[Activity]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.activity_type.label().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Status label to count, in one pass over `activities`
pub fn counts_by_status(activities: &[Activity]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.status.label().to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone)]
pub struct StatisticsService {
    activities: ActivityRepository,
    students: StudentRepository,
    participations: ParticipationRepository,
}

impl StatisticsService {
    pub fn new(
        activities: ActivityRepository,
        students: StudentRepository,
        participations: ParticipationRepository,
    ) -> Self {
        Self {
            activities,
            students,
            participations,
        }
    }

    pub async fn overall_participation_rate(&self) -> Result<f64> {
        let records = self.participations.find_all().await?;
        Ok(overall_participation_rate(&records))
    }

    pub async fn overall_average_score(&self) -> Result<f64> {
        let records = self.participations.find_all().await?;
        Ok(overall_average_score(&records))
    }

    pub async fn activity_counts_by_type(&self) -> Result<BTreeMap<String, usize>> {
        let activities = self.activities.find_all().await?;
        Ok(counts_by_type(&activities))
    }

    pub async fn activity_counts_by_status(&self) -> Result<BTreeMap<String, usize>> {
        let activities = self.activities.find_all().await?;
        Ok(counts_by_status(&activities))
    }

    /// One row per activity, newest first
    pub async fn activity_reports(&self) -> Result<Vec<ActivityReport>> {
        let activities = self.activities.find_all().await?;
        Ok(activities.iter().map(ActivityReport::from).collect())
    }

    /// One row per student, by name
    pub async fn student_reports(&self) -> Result<Vec<StudentReport>> {
        let students = self.students.find_all().await?;
        Ok(students.iter().map(StudentReport::from).collect())
    }

    pub async fn summary(&self) -> Result<StatisticsSummary> {
        let activities = self.activities.find_all().await?;
        let total_students = self.students.count().await?;
        let records = self.participations.find_all().await?;

        let summary = StatisticsSummary {
            total_activities: activities.len(),
            total_students: usize::try_from(total_students).unwrap_or_default(),
            total_participations: records.len(),
            overall_participation_rate: round2(overall_participation_rate(&records)),
            overall_average_score: round2(overall_average_score(&records)),
            activities_by_status: counts_by_status(&activities),
            activities_by_type: counts_by_type(&activities),
        };

        tracing::debug!(
            activities = summary.total_activities,
            participations = summary.total_participations,
            "Computed statistics summary"
        );
        Ok(summary)
    }
}
