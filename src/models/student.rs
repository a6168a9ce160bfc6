//! Student model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::participation::{self, Participation};
use crate::utils::errors::ValidationError;
use crate::utils::validation::{check_range, require_text, validate_email};

pub const MIN_ENROLLMENT_YEAR: i32 = 1900;
pub const MAX_ENROLLMENT_YEAR: i32 = 2100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    id: Option<i64>,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub enrollment_year: Option<i32>,
    pub academic_level: Option<AcademicLevel>,
    pub status: StudentStatus,
    pub address: Option<String>,
    /// Linked login account, if any. Not an ownership relation.
    pub user_id: Option<i64>,
    /// Detached copies of this student's participations, loaded by the repository
    #[sqlx(skip)]
    #[serde(default)]
    pub participations: Vec<Participation>,
}

impl Student {
    pub fn new(
        registration_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            registration_number: registration_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            date_of_birth: None,
            department: None,
            specialization: None,
            enrollment_year: None,
            academic_level: None,
            status: StudentStatus::Active,
            address: None,
            user_id: None,
            participations: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }

    pub fn participation_count(&self) -> usize {
        self.participations.len()
    }

    pub fn participation_rate(&self) -> f64 {
        participation::participation_rate(&self.participations)
    }

    pub fn average_score(&self) -> f64 {
        participation::average_score(&self.participations)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("registration_number", &self.registration_number)?;
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        validate_email(&self.email)?;

        if let Some(year) = self.enrollment_year {
            check_range(
                "enrollment_year",
                f64::from(year),
                f64::from(MIN_ENROLLMENT_YEAR),
                f64::from(MAX_ENROLLMENT_YEAR),
            )?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum AcademicLevel {
    #[sqlx(rename = "LICENSE_1")]
    #[serde(rename = "LICENSE_1")]
    License1,
    #[sqlx(rename = "LICENSE_2")]
    #[serde(rename = "LICENSE_2")]
    License2,
    #[sqlx(rename = "LICENSE_3")]
    #[serde(rename = "LICENSE_3")]
    License3,
    #[sqlx(rename = "MASTER_1")]
    #[serde(rename = "MASTER_1")]
    Master1,
    #[sqlx(rename = "MASTER_2")]
    #[serde(rename = "MASTER_2")]
    Master2,
    #[sqlx(rename = "DOCTORATE")]
    #[serde(rename = "DOCTORATE")]
    Doctorate,
}

impl AcademicLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AcademicLevel::License1 => "License 1",
            AcademicLevel::License2 => "License 2",
            AcademicLevel::License3 => "License 3",
            AcademicLevel::Master1 => "Master 1",
            AcademicLevel::Master2 => "Master 2",
            AcademicLevel::Doctorate => "Doctorate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    Active,
    Inactive,
    Graduated,
    Suspended,
    Transferred,
}

impl StudentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StudentStatus::Active => "Active",
            StudentStatus::Inactive => "Inactive",
            StudentStatus::Graduated => "Graduated",
            StudentStatus::Suspended => "Suspended",
            StudentStatus::Transferred => "Transferred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        Student::new("FST20240001", "Ahmed", "Benali", "ahmed@universite.ma")
    }

    #[test]
    fn test_new_student_defaults() {
        let student = sample();
        assert!(student.id().is_none());
        assert!(student.is_active());
        assert_eq!(student.full_name(), "Ahmed Benali");
        assert_eq!(student.participation_count(), 0);
        assert_eq!(student.participation_rate(), 0.0);
        assert_eq!(student.average_score(), 0.0);
    }

    #[test]
    fn test_validate_accepts_complete_student() {
        let mut student = sample();
        student.enrollment_year = Some(2024);
        student.academic_level = Some(AcademicLevel::License3);
        assert!(student.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut student = sample();
        student.email = "ahmed.at.universite".to_string();
        assert!(matches!(student.validate(), Err(ValidationError::InvalidEmail(_))));

        let mut student = sample();
        student.last_name = String::new();
        assert_eq!(
            student.validate(),
            Err(ValidationError::MissingField { field: "last_name" })
        );

        let mut student = sample();
        student.enrollment_year = Some(1850);
        assert!(matches!(
            student.validate(),
            Err(ValidationError::OutOfRange { field: "enrollment_year", .. })
        ));
    }

    #[test]
    fn test_student_rates() {
        let mut student = sample();
        let mut attended = Participation::new(1, 1);
        attended.set_participated(true);
        attended.set_score(Some(70.0)).unwrap();
        let missed = Participation::new(2, 1);
        student.participations = vec![attended, missed];

        assert_eq!(student.participation_count(), 2);
        assert_eq!(student.participation_rate(), 50.0);
        assert_eq!(student.average_score(), 70.0);
    }
}
