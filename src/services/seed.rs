//! Demo data loader
//!
//! Students are created first so that every seeded activity fans out to all
//! of them. Completed quizzes then get random scores for the first students.

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use tracing::info;

use crate::database::DatabaseService;
use crate::models::{AcademicLevel, Activity, ActivityStatus, ActivityType, Student};
use crate::utils::errors::Result;

const FIRST_NAMES: [&str; 15] = [
    "Ahmed", "Fatima", "Mohamed", "Aicha", "Hassan", "Layla", "Ibrahim", "Noor", "Omar", "Zainab",
    "Khalid", "Samira", "Ali", "Leila", "Youssef",
];

/// How many students get a score on each completed quiz
const SCORED_STUDENTS: usize = 12;

/// (title, description, type, professor, deadline offset in days, status)
const ACTIVITIES: [(&str, &str, ActivityType, &str, i64, ActivityStatus); 12] = [
    ("Introduction to Databases", "Lecture on the core concepts of relational databases", ActivityType::Lecture, "Dr. Ahmed Benali", 7, ActivityStatus::InProgress),
    ("Business Management Project", "Group project building a management system", ActivityType::Project, "Pr. Fatima Haouari", 30, ActivityStatus::InProgress),
    ("Algorithms Quiz", "Short assessment on data structures", ActivityType::Quiz, "Dr. Ahmed Benali", -2, ActivityStatus::Completed),
    ("Practical Work - Python Programming", "Hands-on exercises on Python and algorithms", ActivityType::Practical, "Ing. Hassan Idrissi", 14, ActivityStatus::Planned),
    ("Web Development with React", "Workshop on building modern web applications", ActivityType::Workshop, "Pr. Fatima Haouari", 10, ActivityStatus::InProgress),
    ("Final Exam - Object-Oriented Programming", "Final assessment of the OOP module", ActivityType::Exam, "Dr. Ahmed Benali", 20, ActivityStatus::Planned),
    ("Artificial Intelligence Seminar", "Recent advances in AI and machine learning", ActivityType::Seminar, "Pr. Karim Zahraoui", 5, ActivityStatus::InProgress),
    ("Computer Networks Quiz", "Quick assessment on network protocols", ActivityType::Quiz, "Ing. Hassan Idrissi", -5, ActivityStatus::Completed),
    ("Android Mobile Application Project", "Complete mobile application built in groups", ActivityType::Project, "Pr. Fatima Haouari", 45, ActivityStatus::InProgress),
    ("Practical Work - Computer Security", "Exercises on encryption and system security", ActivityType::Practical, "Dr. Nadia El Ouardi", 12, ActivityStatus::Planned),
    ("Cloud Computing Talk", "Introduction to cloud services", ActivityType::Seminar, "Pr. Karim Zahraoui", -1, ActivityStatus::Completed),
    ("Design Patterns Workshop", "Learning software design patterns", ActivityType::Workshop, "Dr. Ahmed Benali", 8, ActivityStatus::InProgress),
];

/// Counts of what a seeding run created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub students: usize,
    pub activities: usize,
    pub scored: usize,
}

#[derive(Debug, Clone)]
pub struct SeedService {
    database: DatabaseService,
}

impl SeedService {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    /// Load the demo dataset unless activities already exist
    pub async fn initialize_sample_data(&self) -> Result<Option<SeedReport>> {
        if self.database.activities.count().await? > 0 {
            info!("Database already contains data, skipping sample data");
            return Ok(None);
        }

        info!("Loading sample data");
        let today = Utc::now().date_naive();
        let mut report = SeedReport::default();

        for student in sample_students() {
            // Registration numbers already taken are left as they are
            if self.database.students.exists_by_registration_number(&student.registration_number).await? {
                continue;
            }
            self.database.students.save(&student).await?;
            report.students += 1;
        }

        for (title, description, activity_type, professor, offset, status) in ACTIVITIES {
            let mut activity = Activity::new(title, activity_type);
            activity.description = Some(description.to_string());
            activity.professor = Some(professor.to_string());
            activity.deadline = Some(offset_date(today, offset));
            activity.status = status;

            let activity = self.database.activities.save(&activity).await?;
            report.activities += 1;

            if activity_type == ActivityType::Quiz && status == ActivityStatus::Completed {
                report.scored += self.score_quiz(activity).await?;
            }
        }

        info!(
            students = report.students,
            activities = report.activities,
            scored = report.scored,
            "Sample data loaded"
        );
        Ok(Some(report))
    }

    async fn score_quiz(&self, mut quiz: Activity) -> Result<usize> {
        let mut scored = 0;
        for participation in quiz.participations.iter_mut().take(SCORED_STUDENTS) {
            participation.set_participated(true);
            let score = rand::thread_rng().gen_range(50.0..100.0);
            participation.set_score(Some(crate::utils::helpers::round2(score)))?;
            scored += 1;
        }
        self.database.activities.save(&quiz).await?;
        Ok(scored)
    }
}

fn offset_date(today: NaiveDate, days: i64) -> NaiveDate {
    today + Duration::days(days)
}

fn sample_students() -> Vec<Student> {
    FIRST_NAMES
        .iter()
        .enumerate()
        .map(|(i, first_name)| {
            let mut student = Student::new(
                format!("FST2024{:04}", i + 1),
                *first_name,
                format!("Student{}", i + 1),
                format!("{}@universite.ma", first_name.to_lowercase()),
            );
            student.department = Some("Computer Science".to_string());
            student.academic_level = Some(AcademicLevel::License3);
            student.enrollment_year = Some(2024);
            student
        })
        .collect()
}
