//! Participation repository implementation

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;

use crate::database::gateway::StoreGateway;
use crate::models::{Activity, Participation, Student};
use crate::utils::errors::{Result, ValidationError};
use crate::utils::helpers::percentage;

#[derive(Debug, Clone)]
pub struct ParticipationRepository {
    gateway: StoreGateway,
}

impl ParticipationRepository {
    pub fn new(gateway: StoreGateway) -> Self {
        Self { gateway }
    }

    /// Insert a new participation or update the existing one
    pub async fn save(&self, participation: &Participation) -> Result<Participation> {
        let participation = participation.clone();
        self.gateway
            .execute_transaction("participation.save", move |conn| {
                Box::pin(save_participation(conn, participation))
            })
            .await
    }

    /// Explicitly create the participation for a student that was added after
    /// the activity. Returns the existing record if the pair is already covered.
    pub async fn create_for(&self, activity_id: i64, student_id: i64) -> Result<Participation> {
        self.gateway
            .execute_transaction("participation.create_for", move |conn| {
                Box::pin(create_for(conn, activity_id, student_id))
            })
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Participation>> {
        self.gateway
            .execute_query("participation.find_by_id", move |conn| {
                Box::pin(async move {
                    let found = sqlx::query_as::<_, Participation>(
                        "SELECT * FROM participations WHERE id = ?1",
                    )
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
                    Ok(found)
                })
            })
            .await
    }

    pub async fn find_all(&self) -> Result<Vec<Participation>> {
        self.gateway
            .execute_query("participation.find_all", |conn| {
                Box::pin(async move {
                    let all = sqlx::query_as::<_, Participation>(
                        "SELECT * FROM participations ORDER BY activity_id, id",
                    )
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok(all)
                })
            })
            .await
    }

    pub async fn find_by_activity(&self, activity_id: i64) -> Result<Vec<Participation>> {
        self.find_filtered("participation.find_by_activity", "activity_id = ?1", activity_id)
            .await
    }

    pub async fn find_by_student(&self, student_id: i64) -> Result<Vec<Participation>> {
        self.find_filtered("participation.find_by_student", "student_id = ?1", student_id)
            .await
    }

    pub async fn find_participated_by_activity(&self, activity_id: i64) -> Result<Vec<Participation>> {
        self.find_filtered(
            "participation.find_participated_by_activity",
            "activity_id = ?1 AND participated = 1",
            activity_id,
        )
        .await
    }

    pub async fn find_non_participated_by_activity(&self, activity_id: i64) -> Result<Vec<Participation>> {
        self.find_filtered(
            "participation.find_non_participated_by_activity",
            "activity_id = ?1 AND participated = 0",
            activity_id,
        )
        .await
    }

    /// Zero or one record under the fan-out rule
    pub async fn find_by_activity_and_student(
        &self,
        activity_id: i64,
        student_id: i64,
    ) -> Result<Option<Participation>> {
        self.gateway
            .execute_query("participation.find_by_activity_and_student", move |conn| {
                Box::pin(find_pair(conn, activity_id, student_id))
            })
            .await
    }

    pub async fn count_by_activity(&self, activity_id: i64) -> Result<i64> {
        self.count_filtered("participation.count_by_activity", "activity_id = ?1", activity_id)
            .await
    }

    pub async fn count_participated_by_activity(&self, activity_id: i64) -> Result<i64> {
        self.count_filtered(
            "participation.count_participated_by_activity",
            "activity_id = ?1 AND participated = 1",
            activity_id,
        )
        .await
    }

    /// Mean of every non-null score for the activity, 0 when none
    pub async fn average_score_by_activity(&self, activity_id: i64) -> Result<f64> {
        self.gateway
            .execute_query("participation.average_score_by_activity", move |conn| {
                Box::pin(async move {
                    let average: Option<f64> = sqlx::query_scalar(
                        "SELECT AVG(score) FROM participations WHERE activity_id = ?1 AND score IS NOT NULL",
                    )
                    .bind(activity_id)
                    .fetch_one(&mut *conn)
                    .await?;
                    Ok(average.unwrap_or(0.0))
                })
            })
            .await
    }

    /// Participated over total, as a percentage; 0 for an activity without records
    pub async fn participation_rate_by_activity(&self, activity_id: i64) -> Result<f64> {
        self.gateway
            .execute_query("participation.participation_rate_by_activity", move |conn| {
                Box::pin(async move {
                    let (total, participated): (i64, i64) = sqlx::query_as(
                        "SELECT COUNT(*), COALESCE(SUM(participated), 0) FROM participations WHERE activity_id = ?1",
                    )
                    .bind(activity_id)
                    .fetch_one(&mut *conn)
                    .await?;
                    Ok(percentage(participated as usize, total as usize))
                })
            })
            .await
    }

    /// Returns false when the record no longer exists
    pub async fn delete(&self, participation: &Participation) -> Result<bool> {
        let Some(id) = participation.id() else {
            return Ok(false);
        };
        self.gateway
            .execute_transaction("participation.delete", move |conn| {
                Box::pin(async move {
                    let done = sqlx::query("DELETE FROM participations WHERE id = ?1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    Ok(done.rows_affected() > 0)
                })
            })
            .await
    }

    async fn find_filtered(
        &self,
        operation: &'static str,
        condition: &'static str,
        key: i64,
    ) -> Result<Vec<Participation>> {
        self.gateway
            .execute_query(operation, move |conn| {
                Box::pin(async move {
                    let sql = format!("SELECT * FROM participations WHERE {} ORDER BY id", condition);
                    let rows = sqlx::query_as::<_, Participation>(&sql)
                        .bind(key)
                        .fetch_all(&mut *conn)
                        .await?;
                    Ok(rows)
                })
            })
            .await
    }

    async fn count_filtered(&self, operation: &'static str, condition: &'static str, key: i64) -> Result<i64> {
        self.gateway
            .execute_query(operation, move |conn| {
                Box::pin(async move {
                    let sql = format!("SELECT COUNT(*) FROM participations WHERE {}", condition);
                    let count: i64 = sqlx::query_scalar(&sql).bind(key).fetch_one(&mut *conn).await?;
                    Ok(count)
                })
            })
            .await
    }
}

async fn save_participation(conn: &mut SqliteConnection, participation: Participation) -> Result<Participation> {
    participation.validate()?;
    match participation.id() {
        None => insert_participation(conn, &participation).await,
        Some(id) => update_participation(conn, id, &participation).await,
    }
}

async fn create_for(conn: &mut SqliteConnection, activity_id: i64, student_id: i64) -> Result<Participation> {
    if let Some(existing) = find_pair(conn, activity_id, student_id).await? {
        return Ok(existing);
    }
    insert_participation(conn, &Participation::new(activity_id, student_id)).await
}

async fn find_pair(conn: &mut SqliteConnection, activity_id: i64, student_id: i64) -> Result<Option<Participation>> {
    let found = sqlx::query_as::<_, Participation>(
        "SELECT * FROM participations WHERE activity_id = ?1 AND student_id = ?2 ORDER BY id LIMIT 1",
    )
    .bind(activity_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(found)
}

async fn ensure_exists(conn: &mut SqliteConnection, entity: &'static str, id: i64) -> Result<()> {
    let sql = match entity {
        "activity" => "SELECT EXISTS(SELECT 1 FROM activities WHERE id = ?1)",
        _ => "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1)",
    };
    let exists: bool = sqlx::query_scalar(sql).bind(id).fetch_one(&mut *conn).await?;
    if !exists {
        return Err(ValidationError::UnknownReference { entity, id }.into());
    }
    Ok(())
}

pub(crate) async fn insert_participation(
    conn: &mut SqliteConnection,
    participation: &Participation,
) -> Result<Participation> {
    ensure_exists(conn, "activity", participation.activity_id()).await?;
    ensure_exists(conn, "student", participation.student_id()).await?;

    let created = sqlx::query_as::<_, Participation>(
        r#"
        INSERT INTO participations (activity_id, student_id, participated, score, feedback, participation_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING *
        "#,
    )
    .bind(participation.activity_id())
    .bind(participation.student_id())
    .bind(participation.participated())
    .bind(participation.score())
    .bind(&participation.feedback)
    .bind(participation.participation_date())
    .fetch_one(&mut *conn)
    .await?;

    Ok(created)
}

pub(crate) async fn update_participation(
    conn: &mut SqliteConnection,
    id: i64,
    participation: &Participation,
) -> Result<Participation> {
    // The activity and student references are immutable once stored; the
    // activity guard keeps one activity's save from touching another's rows
    let updated = sqlx::query_as::<_, Participation>(
        r#"
        UPDATE participations
        SET participated = ?2,
            score = ?3,
            feedback = ?4,
            participation_date = COALESCE(participation_date, ?5)
        WHERE id = ?1 AND activity_id = ?6
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(participation.participated())
    .bind(participation.score())
    .bind(&participation.feedback)
    .bind(participation.participation_date())
    .bind(participation.activity_id())
    .fetch_optional(&mut *conn)
    .await?;

    updated.ok_or_else(|| ValidationError::UnknownReference { entity: "participation", id }.into())
}

/// Fill each activity's participation collection from the store
pub(crate) async fn attach_to_activities(conn: &mut SqliteConnection, activities: &mut [Activity]) -> Result<()> {
    let ids: Vec<i64> = activities.iter().filter_map(Activity::id).collect();
    let mut grouped = load_grouped(conn, "activity_id", &ids, |p| p.activity_id()).await?;
    for activity in activities.iter_mut() {
        if let Some(id) = activity.id() {
            activity.participations = grouped.remove(&id).unwrap_or_default();
        }
    }
    Ok(())
}

/// Fill each student's participation collection from the store
pub(crate) async fn attach_to_students(conn: &mut SqliteConnection, students: &mut [Student]) -> Result<()> {
    let ids: Vec<i64> = students.iter().filter_map(Student::id).collect();
    let mut grouped = load_grouped(conn, "student_id", &ids, |p| p.student_id()).await?;
    for student in students.iter_mut() {
        if let Some(id) = student.id() {
            student.participations = grouped.remove(&id).unwrap_or_default();
        }
    }
    Ok(())
}

async fn load_grouped(
    conn: &mut SqliteConnection,
    column: &'static str,
    ids: &[i64],
    key: fn(&Participation) -> i64,
) -> Result<HashMap<i64, Vec<Participation>>> {
    let mut grouped: HashMap<i64, Vec<Participation>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM participations WHERE ");
    query.push(column).push(" IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let rows = query
        .build_query_as::<Participation>()
        .fetch_all(&mut *conn)
        .await?;

    for participation in rows {
        grouped.entry(key(&participation)).or_default().push(participation);
    }
    Ok(grouped)
}
