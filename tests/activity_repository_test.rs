//! Activity repository integration tests

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};

use activity_tracker::models::{ActivitySearch, ActivityStatus, ActivityType, Participation};
use activity_tracker::utils::errors::ValidationError;
use activity_tracker::TrackerError;
use helpers::*;

#[tokio::test]
async fn test_create_fans_out_to_existing_students() {
    let db = TestDatabase::new().await.expect("Failed to create test database");

    for expected in 0..4 {
        if expected > 0 {
            db.service
                .students
                .save(&create_test_student(100 + expected))
                .await
                .unwrap();
        }

        let activity = db
            .service
            .activities
            .save(&create_test_activity(&format!("Lecture {}", expected), ActivityType::Lecture))
            .await
            .unwrap();
        let id = activity.id().expect("saved activity has an id");

        assert_eq!(activity.participations.len(), expected);
        let stored = db.service.participations.find_by_activity(id).await.unwrap();
        assert_eq!(stored.len(), expected);
        assert!(stored.iter().all(|p| !p.participated() && p.score().is_none()));
        assert!(stored.iter().all(|p| p.participation_date().is_none()));
    }
}

#[tokio::test]
async fn test_new_student_is_not_added_to_existing_activities() {
    let db = TestDatabase::new().await.unwrap();
    save_students(&db.service, 2).await;

    let activity = db
        .service
        .activities
        .save(&create_test_activity("Quiz", ActivityType::Quiz))
        .await
        .unwrap();
    let activity_id = activity.id().unwrap();

    let late = db.service.students.save(&create_test_student(50)).await.unwrap();
    let late_id = late.id().unwrap();

    assert_eq!(db.service.participations.count_by_activity(activity_id).await.unwrap(), 2);
    assert!(db
        .service
        .participations
        .find_by_activity_and_student(activity_id, late_id)
        .await
        .unwrap()
        .is_none());

    // Retroactive coverage is explicit
    let created = db.service.participations.create_for(activity_id, late_id).await.unwrap();
    assert_eq!(created.student_id(), late_id);
    let again = db.service.participations.create_for(activity_id, late_id).await.unwrap();
    assert_eq!(again.id(), created.id());
    assert_eq!(db.service.participations.count_by_activity(activity_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_delete_cascades_to_participations() {
    let db = TestDatabase::new().await.unwrap();
    save_students(&db.service, 3).await;

    let activity = db
        .service
        .activities
        .save(&create_test_activity("Project", ActivityType::Project))
        .await
        .unwrap();
    let activity_id = activity.id().unwrap();
    let other = db
        .service
        .activities
        .save(&create_test_activity("Exam", ActivityType::Exam))
        .await
        .unwrap();

    assert!(db.service.activities.delete(&activity).await.unwrap());

    assert!(db.service.activities.find_by_id(activity_id).await.unwrap().is_none());
    assert!(db.service.participations.find_by_activity(activity_id).await.unwrap().is_empty());
    assert_eq!(db.count_records("participations").await.unwrap(), 3);
    assert_eq!(
        db.service.participations.count_by_activity(other.id().unwrap()).await.unwrap(),
        3
    );

    // Deleting again is a no-op
    assert!(!db.service.activities.delete(&activity).await.unwrap());
}

#[tokio::test]
async fn test_find_by_id_round_trip_loads_participations() {
    let db = TestDatabase::new().await.unwrap();
    save_students(&db.service, 2).await;

    let mut activity = create_test_activity("Seminar", ActivityType::Seminar);
    activity.deadline = Some(Utc::now().date_naive() + Duration::days(3));
    activity.status = ActivityStatus::InProgress;
    let saved = db.service.activities.save(&activity).await.unwrap();

    let found = db
        .service
        .activities
        .find_by_id(saved.id().unwrap())
        .await
        .unwrap()
        .expect("activity should exist");

    assert_eq!(found.title, "Seminar");
    assert_eq!(found.description, activity.description);
    assert_eq!(found.deadline, activity.deadline);
    assert_eq!(found.status, ActivityStatus::InProgress);
    assert_eq!(found.activity_type, ActivityType::Seminar);
    assert_eq!(found.professor, activity.professor);
    assert_eq!(found.participations.len(), 2);
    assert_eq!(found.participations, saved.participations);

    assert!(db.service.activities.find_by_id(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_saves_owned_participations() {
    let db = TestDatabase::new().await.unwrap();
    save_students(&db.service, 3).await;

    let mut activity = db
        .service
        .activities
        .save(&create_test_activity("Workshop", ActivityType::Workshop))
        .await
        .unwrap();

    activity.title = "Workshop (updated)".to_string();
    activity.status = ActivityStatus::Completed;
    activity.participations[0].set_participated(true);
    activity.participations[0].set_score(Some(88.0)).unwrap();
    activity.participations[1].feedback = Some("Absent".to_string());

    let updated = db.service.activities.save(&activity).await.unwrap();

    assert_eq!(updated.id(), activity.id());
    assert_eq!(updated.title, "Workshop (updated)");
    assert_eq!(updated.created_at(), activity.created_at());
    assert_eq!(updated.participations.len(), 3);
    assert_eq!(updated.participating_count(), 1);
    assert_eq!(updated.average_score(), 88.0);
    assert!(updated.participations[0].participation_date().is_some());
    assert_eq!(updated.participations[1].feedback.as_deref(), Some("Absent"));
}

#[tokio::test]
async fn test_save_rejects_missing_title() {
    let db = TestDatabase::new().await.unwrap();

    let result = db
        .service
        .activities
        .save(&create_test_activity("   ", ActivityType::Lecture))
        .await;

    assert_matches!(
        result,
        Err(TrackerError::Validation(ValidationError::MissingField { field: "title" }))
    );
    assert_eq!(db.service.activities.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_find_all_orders_newest_first() {
    let db = TestDatabase::new().await.unwrap();

    for title in ["First", "Second", "Third"] {
        db.service
            .activities
            .save(&create_test_activity(title, ActivityType::Lecture))
            .await
            .unwrap();
    }

    let titles: Vec<String> = db
        .service
        .activities
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_search_and_filters() {
    let db = TestDatabase::new().await.unwrap();
    let repo = &db.service.activities;

    let mut quiz = create_test_activity("Algorithms Quiz", ActivityType::Quiz);
    quiz.status = ActivityStatus::Completed;
    repo.save(&quiz).await.unwrap();

    let mut networks = create_test_activity("Networks quiz", ActivityType::Quiz);
    networks.professor = Some("Ing. Hassan Idrissi".to_string());
    repo.save(&networks).await.unwrap();

    repo.save(&create_test_activity("100% Python", ActivityType::Practical))
        .await
        .unwrap();

    assert_eq!(repo.search_by_title("QUIZ").await.unwrap().len(), 2);
    assert_eq!(repo.search_by_title("100%").await.unwrap().len(), 1);
    assert_eq!(repo.search_by_title("%").await.unwrap().len(), 1);
    assert_eq!(repo.find_by_type(ActivityType::Quiz).await.unwrap().len(), 2);
    assert_eq!(repo.find_by_status(ActivityStatus::Completed).await.unwrap().len(), 1);
    assert_eq!(repo.find_by_professor("Ing. Hassan Idrissi").await.unwrap().len(), 1);
    assert_eq!(repo.count_by_status(ActivityStatus::Planned).await.unwrap(), 2);

    let found = repo
        .advanced_search(ActivitySearch {
            title: Some("quiz".to_string()),
            status: Some(ActivityStatus::Planned),
            professor: Some("hassan".to_string()),
            ..ActivitySearch::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Networks quiz");

    let everything = repo.advanced_search(ActivitySearch::default()).await.unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn test_deadline_queries() {
    let db = TestDatabase::new().await.unwrap();
    let repo = &db.service.activities;
    let today = Utc::now().date_naive();

    let mut past_open = create_test_activity("Late report", ActivityType::Assignment);
    past_open.deadline = Some(today - Duration::days(2));
    repo.save(&past_open).await.unwrap();

    let mut past_done = create_test_activity("Finished quiz", ActivityType::Quiz);
    past_done.deadline = Some(today - Duration::days(1));
    past_done.status = ActivityStatus::Completed;
    repo.save(&past_done).await.unwrap();

    let mut soon = create_test_activity("Due today", ActivityType::Assignment);
    soon.deadline = Some(today);
    repo.save(&soon).await.unwrap();

    let mut later = create_test_activity("Next month", ActivityType::Project);
    later.deadline = Some(today + Duration::days(30));
    repo.save(&later).await.unwrap();

    repo.save(&create_test_activity("No deadline", ActivityType::Lecture))
        .await
        .unwrap();

    let overdue = repo.find_overdue(today).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].title, "Late report");

    let upcoming: Vec<String> = repo
        .find_upcoming(today)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(upcoming, vec!["Due today", "Next month"]);

    let window = repo
        .find_by_deadline_between(today - Duration::days(2), today)
        .await
        .unwrap();
    assert_eq!(window.len(), 3);
    assert_eq!(window[0].title, "Late report");
}

#[tokio::test]
async fn test_accented_title_and_professor_search() {
    let db = TestDatabase::new().await.unwrap();
    let repo = &db.service.activities;

    let mut seminar = create_test_activity("Séminaire Éthique", ActivityType::Seminar);
    seminar.professor = Some("Pr. Élodie Ménard".to_string());
    repo.save(&seminar).await.unwrap();
    repo.save(&create_test_activity("Lecture", ActivityType::Lecture))
        .await
        .unwrap();

    assert_eq!(repo.search_by_title("éthique").await.unwrap().len(), 1);
    assert_eq!(repo.search_by_title("SÉMINAIRE").await.unwrap().len(), 1);

    let found = repo
        .advanced_search(ActivitySearch {
            professor: Some("MÉNARD".to_string()),
            ..ActivitySearch::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Séminaire Éthique");
}

#[tokio::test]
async fn test_update_cannot_touch_another_activitys_participation() {
    let db = TestDatabase::new().await.unwrap();
    save_students(&db.service, 1).await;
    let repo = &db.service.activities;

    let mut target = repo
        .save(&create_test_activity("Target", ActivityType::Quiz))
        .await
        .unwrap();
    let other = repo
        .save(&create_test_activity("Other", ActivityType::Quiz))
        .await
        .unwrap();
    let target_id = target.id().unwrap();
    let other_id = other.id().unwrap();

    // Re-home the other activity's record under the target
    let mut value = serde_json::to_value(&other.participations[0]).unwrap();
    value["activity_id"] = serde_json::json!(target_id);
    value["score"] = serde_json::json!(99.0);
    let foreign: Participation = serde_json::from_value(value).unwrap();

    target.title = "Target (renamed)".to_string();
    target.participations[0].set_score(Some(40.0)).unwrap();
    target.participations.push(foreign);

    let result = repo.save(&target).await;
    assert_matches!(
        result,
        Err(TrackerError::Validation(ValidationError::UnknownReference {
            entity: "participation",
            ..
        }))
    );

    let other_stored = db.service.participations.find_by_activity(other_id).await.unwrap();
    assert_eq!(other_stored, other.participations);

    // Nothing from the rejected save is committed
    let target_stored = repo.find_by_id(target_id).await.unwrap().unwrap();
    assert_eq!(target_stored.title, "Target");
    assert!(target_stored.participations.iter().all(|p| p.score().is_none()));
}
