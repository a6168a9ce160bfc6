//! Activity repository implementation

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::database::gateway::StoreGateway;
use crate::database::repositories::participation::{
    attach_to_activities, insert_participation, update_participation,
};
use crate::models::{Activity, ActivitySearch, ActivityStatus, ActivityType, Participation};
use crate::utils::errors::{Result, ValidationError};
use crate::utils::helpers::contains_ignore_case;

const ORDER_NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    gateway: StoreGateway,
}

impl ActivityRepository {
    pub fn new(gateway: StoreGateway) -> Self {
        Self { gateway }
    }

    /// Insert or update an activity.
    ///
    /// A new activity gets one default participation per student existing at
    /// that moment. Updating writes the activity row and every participation
    /// in its collection; records missing from the collection are left alone.
    pub async fn save(&self, activity: &Activity) -> Result<Activity> {
        activity.validate()?;
        let activity = activity.clone();
        self.gateway
            .execute_transaction("activity.save", move |conn| Box::pin(save_activity(conn, activity)))
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Activity>> {
        self.gateway
            .execute_query("activity.find_by_id", move |conn| {
                Box::pin(async move {
                    let found = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?1")
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await?;
                    match found {
                        Some(activity) => {
                            let mut loaded = [activity];
                            attach_to_activities(conn, &mut loaded).await?;
                            let [activity] = loaded;
                            Ok(Some(activity))
                        }
                        None => Ok(None),
                    }
                })
            })
            .await
    }

    /// All activities, newest first
    pub async fn find_all(&self) -> Result<Vec<Activity>> {
        let sql = format!("SELECT * FROM activities{}", ORDER_NEWEST_FIRST);
        self.gateway
            .execute_query("activity.find_all", move |conn| Box::pin(fetch_loaded(conn, sql, Vec::new())))
            .await
    }

    pub async fn find_by_status(&self, status: ActivityStatus) -> Result<Vec<Activity>> {
        self.advanced_search(ActivitySearch {
            status: Some(status),
            ..ActivitySearch::default()
        })
        .await
    }

    pub async fn find_by_type(&self, activity_type: ActivityType) -> Result<Vec<Activity>> {
        self.advanced_search(ActivitySearch {
            activity_type: Some(activity_type),
            ..ActivitySearch::default()
        })
        .await
    }

    /// Exact professor name match
    pub async fn find_by_professor(&self, professor: &str) -> Result<Vec<Activity>> {
        let sql = format!("SELECT * FROM activities WHERE professor = ?1{}", ORDER_NEWEST_FIRST);
        let args = vec![Arg::Text(professor.to_string())];
        self.gateway
            .execute_query("activity.find_by_professor", move |conn| Box::pin(fetch_loaded(conn, sql, args)))
            .await
    }

    /// Activities whose deadline falls in `[start, end]`, soonest first
    pub async fn find_by_deadline_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Activity>> {
        let sql = "SELECT * FROM activities WHERE deadline BETWEEN ?1 AND ?2 ORDER BY deadline, id".to_string();
        let args = vec![Arg::Date(start), Arg::Date(end)];
        self.gateway
            .execute_query("activity.find_by_deadline_between", move |conn| {
                Box::pin(fetch_loaded(conn, sql, args))
            })
            .await
    }

    /// Deadline today or later, soonest first
    pub async fn find_upcoming(&self, today: NaiveDate) -> Result<Vec<Activity>> {
        let sql = "SELECT * FROM activities WHERE deadline >= ?1 ORDER BY deadline, id".to_string();
        let args = vec![Arg::Date(today)];
        self.gateway
            .execute_query("activity.find_upcoming", move |conn| Box::pin(fetch_loaded(conn, sql, args)))
            .await
    }

    /// Deadline passed and not completed
    pub async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Activity>> {
        let sql = "SELECT * FROM activities WHERE deadline < ?1 AND status <> ?2 ORDER BY deadline, id".to_string();
        let args = vec![Arg::Date(today), Arg::Status(ActivityStatus::Completed)];
        self.gateway
            .execute_query("activity.find_overdue", move |conn| Box::pin(fetch_loaded(conn, sql, args)))
            .await
    }

    /// Case-insensitive substring match on the title
    pub async fn search_by_title(&self, term: &str) -> Result<Vec<Activity>> {
        self.advanced_search(ActivitySearch {
            title: Some(term.to_string()),
            ..ActivitySearch::default()
        })
        .await
    }

    /// AND-combination of every criterion that is set
    pub async fn advanced_search(&self, search: ActivitySearch) -> Result<Vec<Activity>> {
        self.gateway
            .execute_query("activity.advanced_search", move |conn| Box::pin(search_activities(conn, search)))
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.gateway
            .execute_query("activity.count", |conn| {
                Box::pin(async move {
                    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(count)
                })
            })
            .await
    }

    pub async fn count_by_status(&self, status: ActivityStatus) -> Result<i64> {
        self.gateway
            .execute_query("activity.count_by_status", move |conn| {
                Box::pin(async move {
                    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE status = ?1")
                        .bind(status)
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(count)
                })
            })
            .await
    }

    /// Delete an activity and all of its participations.
    ///
    /// Returns false when the activity has no identity or no longer exists.
    pub async fn delete(&self, activity: &Activity) -> Result<bool> {
        match activity.id() {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(false),
        }
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        self.gateway
            .execute_transaction("activity.delete", move |conn| Box::pin(delete_activity(conn, id)))
            .await
    }
}

/// Positional bind values for the fixed-shape finders
enum Arg {
    Text(String),
    Date(NaiveDate),
    Status(ActivityStatus),
}

async fn fetch_loaded(conn: &mut SqliteConnection, sql: String, args: Vec<Arg>) -> Result<Vec<Activity>> {
    let mut query = sqlx::query_as::<_, Activity>(&sql);
    for arg in args {
        query = match arg {
            Arg::Text(value) => query.bind(value),
            Arg::Date(value) => query.bind(value),
            Arg::Status(value) => query.bind(value),
        };
    }

    let mut activities = query.fetch_all(&mut *conn).await?;
    attach_to_activities(conn, &mut activities).await?;
    Ok(activities)
}

async fn save_activity(conn: &mut SqliteConnection, activity: Activity) -> Result<Activity> {
    match activity.id() {
        None => insert_activity(conn, activity).await,
        Some(id) => update_activity(conn, id, activity).await,
    }
}

async fn insert_activity(conn: &mut SqliteConnection, activity: Activity) -> Result<Activity> {
    let mut created = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (title, description, created_at, deadline, status, activity_type, professor)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING *
        "#,
    )
    .bind(&activity.title)
    .bind(&activity.description)
    .bind(activity.created_at())
    .bind(activity.deadline)
    .bind(activity.status)
    .bind(activity.activity_type)
    .bind(&activity.professor)
    .fetch_one(&mut *conn)
    .await?;

    let activity_id = created
        .id()
        .ok_or_else(|| ValidationError::Invalid("store returned an activity without id".to_string()))?;

    // Fan-out: one default record per student existing right now
    let student_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM students ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    let mut participations = Vec::with_capacity(student_ids.len());
    for student_id in student_ids {
        let participation = insert_participation(conn, &Participation::new(activity_id, student_id)).await?;
        participations.push(participation);
    }
    created.participations = participations;

    tracing::info!(
        activity_id = activity_id,
        participations = created.participations.len(),
        "Created activity"
    );
    Ok(created)
}

async fn update_activity(conn: &mut SqliteConnection, id: i64, activity: Activity) -> Result<Activity> {
    let updated = sqlx::query_as::<_, Activity>(
        r#"
        UPDATE activities
        SET title = ?2,
            description = ?3,
            deadline = ?4,
            status = ?5,
            activity_type = ?6,
            professor = ?7
        WHERE id = ?1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&activity.title)
    .bind(&activity.description)
    .bind(activity.deadline)
    .bind(activity.status)
    .bind(activity.activity_type)
    .bind(&activity.professor)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(updated) = updated else {
        return Err(ValidationError::UnknownReference { entity: "activity", id }.into());
    };

    for participation in &activity.participations {
        if participation.activity_id() != id {
            return Err(ValidationError::Invalid(format!(
                "participation belongs to activity {}, not {}",
                participation.activity_id(),
                id
            ))
            .into());
        }
        participation.validate()?;
        match participation.id() {
            Some(participation_id) => {
                update_participation(conn, participation_id, participation).await?;
            }
            None => {
                insert_participation(conn, participation).await?;
            }
        }
    }

    let mut loaded = [updated];
    attach_to_activities(conn, &mut loaded).await?;
    let [updated] = loaded;
    Ok(updated)
}

async fn search_activities(conn: &mut SqliteConnection, search: ActivitySearch) -> Result<Vec<Activity>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM activities WHERE 1 = 1");

    if let Some(status) = search.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(activity_type) = search.activity_type {
        query.push(" AND activity_type = ").push_bind(activity_type);
    }
    query.push(ORDER_NEWEST_FIRST);

    let title = search.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let professor = search.professor.as_deref().map(str::trim).filter(|p| !p.is_empty());

    // Text criteria are matched here rather than in SQL for Unicode case folding
    let mut activities: Vec<Activity> = query
        .build_query_as::<Activity>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .filter(|a| title.map_or(true, |t| contains_ignore_case(&a.title, t)))
        .filter(|a| {
            professor.map_or(true, |p| {
                a.professor.as_deref().is_some_and(|name| contains_ignore_case(name, p))
            })
        })
        .collect();

    attach_to_activities(conn, &mut activities).await?;
    Ok(activities)
}

async fn delete_activity(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let removed = sqlx::query("DELETE FROM participations WHERE activity_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM activities WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
        > 0;

    if deleted {
        tracing::info!(activity_id = id, participations = removed, "Deleted activity");
    }
    Ok(deleted)
}
