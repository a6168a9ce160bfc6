//! Test data helpers for creating test entities

use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use std::sync::Mutex;

use activity_tracker::database::DatabaseService;
use activity_tracker::models::{Activity, ActivityType, Student};
use activity_tracker::services::{Notifier, OutboundEmail};

/// Unsaved student with a random name; `n` keeps the unique fields distinct
pub fn create_test_student(n: usize) -> Student {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    Student::new(
        format!("TEST{:05}", n),
        first_name,
        last_name,
        format!("student{}@universite.ma", n),
    )
}

/// Unsaved student with a fixed name, for ordering assertions
pub fn create_named_student(n: usize, first_name: &str, last_name: &str) -> Student {
    Student::new(
        format!("TEST{:05}", n),
        first_name,
        last_name,
        format!("student{}@universite.ma", n),
    )
}

pub fn create_test_activity(title: &str, activity_type: ActivityType) -> Activity {
    let mut activity = Activity::new(title, activity_type);
    activity.description = Some(format!("Description of {}", title));
    activity.professor = Some("Dr. Ahmed Benali".to_string());
    activity
}

/// Save `count` random students and return them with their ids
pub async fn save_students(db: &DatabaseService, count: usize) -> Vec<Student> {
    let mut saved = Vec::with_capacity(count);
    for n in 0..count {
        let student = db
            .students
            .save(&create_test_student(n))
            .await
            .expect("Failed to save student");
        saved.push(student);
    }
    saved
}

/// Notifier that keeps every delivered message for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, email: &OutboundEmail) {
        self.sent.lock().unwrap().push(email.clone());
    }
}
