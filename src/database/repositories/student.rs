//! Student repository implementation

use sqlx::SqliteConnection;

use crate::database::gateway::StoreGateway;
use crate::database::repositories::participation::attach_to_students;
use crate::models::{AcademicLevel, Student, StudentStatus};
use crate::utils::errors::{Result, ValidationError};
use crate::utils::helpers::contains_ignore_case;

const ORDER_BY_NAME: &str = " ORDER BY last_name, first_name, id";

#[derive(Debug, Clone)]
pub struct StudentRepository {
    gateway: StoreGateway,
}

impl StudentRepository {
    pub fn new(gateway: StoreGateway) -> Self {
        Self { gateway }
    }

    /// Insert or update a student.
    ///
    /// A new student is not added to existing activities; use
    /// `ParticipationRepository::create_for` for that.
    pub async fn save(&self, student: &Student) -> Result<Student> {
        student.validate()?;
        let student = student.clone();
        self.gateway
            .execute_transaction("student.save", move |conn| Box::pin(save_student(conn, student)))
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.find_one("student.find_by_id", "id = ?1", Key::Id(id)).await
    }

    pub async fn find_by_registration_number(&self, registration_number: &str) -> Result<Option<Student>> {
        self.find_one(
            "student.find_by_registration_number",
            "registration_number = ?1",
            Key::Text(registration_number.to_string()),
        )
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        self.find_one("student.find_by_email", "email = ?1", Key::Text(email.to_string()))
            .await
    }

    /// Student linked to the given user account
    pub async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Student>> {
        self.find_one("student.find_by_user_id", "user_id = ?1", Key::Id(user_id)).await
    }

    /// All students ordered by last name, then first name
    pub async fn find_all(&self) -> Result<Vec<Student>> {
        self.find_many("student.find_all", "1 = 1", None).await
    }

    pub async fn find_by_department(&self, department: &str) -> Result<Vec<Student>> {
        self.find_many(
            "student.find_by_department",
            "department = ?1",
            Some(Key::Text(department.to_string())),
        )
        .await
    }

    pub async fn find_by_academic_level(&self, level: AcademicLevel) -> Result<Vec<Student>> {
        self.find_many("student.find_by_academic_level", "academic_level = ?1", Some(Key::Level(level)))
            .await
    }

    pub async fn find_by_status(&self, status: StudentStatus) -> Result<Vec<Student>> {
        self.find_many("student.find_by_status", "status = ?1", Some(Key::Status(status)))
            .await
    }

    /// Case-insensitive substring match on first or last name
    /// Students whose first or last name contains `term`, ignoring case
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Student>> {
        let term = term.trim().to_string();
        self.gateway
            .execute_query("student.search_by_name", move |conn| {
                Box::pin(async move {
                    let sql = format!("SELECT * FROM students{}", ORDER_BY_NAME);
                    let mut students: Vec<Student> = sqlx::query_as::<_, Student>(&sql)
                        .fetch_all(&mut *conn)
                        .await?
                        .into_iter()
                        .filter(|s| {
                            contains_ignore_case(&s.first_name, &term) || contains_ignore_case(&s.last_name, &term)
                        })
                        .collect();
                    attach_to_students(conn, &mut students).await?;
                    Ok(students)
                })
            })
            .await
    }

    pub async fn exists_by_registration_number(&self, registration_number: &str) -> Result<bool> {
        let registration_number = registration_number.to_string();
        self.gateway
            .execute_query("student.exists_by_registration_number", move |conn| {
                Box::pin(async move { exists(conn, "registration_number", Key::Text(registration_number), None).await })
            })
            .await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let email = email.to_string();
        self.gateway
            .execute_query("student.exists_by_email", move |conn| {
                Box::pin(async move { exists(conn, "email", Key::Text(email), None).await })
            })
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.gateway
            .execute_query("student.count", |conn| {
                Box::pin(async move {
                    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(count)
                })
            })
            .await
    }

    /// Delete a student together with the participations that reference it.
    ///
    /// Returns false when the student has no identity or no longer exists.
    pub async fn delete(&self, student: &Student) -> Result<bool> {
        let Some(id) = student.id() else {
            return Ok(false);
        };
        self.gateway
            .execute_transaction("student.delete", move |conn| Box::pin(delete_student(conn, id)))
            .await
    }

    async fn find_one(&self, operation: &'static str, condition: &'static str, key: Key) -> Result<Option<Student>> {
        let mut found = self.find_many(operation, condition, Some(key)).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    async fn find_many(
        &self,
        operation: &'static str,
        condition: &'static str,
        key: Option<Key>,
    ) -> Result<Vec<Student>> {
        self.gateway
            .execute_query(operation, move |conn| Box::pin(fetch_loaded(conn, condition, key)))
            .await
    }
}

enum Key {
    Id(i64),
    Text(String),
    Level(AcademicLevel),
    Status(StudentStatus),
}

async fn fetch_loaded(conn: &mut SqliteConnection, condition: &'static str, key: Option<Key>) -> Result<Vec<Student>> {
    let sql = format!("SELECT * FROM students WHERE {}{}", condition, ORDER_BY_NAME);
    let query = sqlx::query_as::<_, Student>(&sql);
    let query = match key {
        Some(Key::Id(value)) => query.bind(value),
        Some(Key::Text(value)) => query.bind(value),
        Some(Key::Level(value)) => query.bind(value),
        Some(Key::Status(value)) => query.bind(value),
        None => query,
    };

    let mut students = query.fetch_all(&mut *conn).await?;
    attach_to_students(conn, &mut students).await?;
    Ok(students)
}

/// Whether another student already uses `value` in `column`
async fn exists(conn: &mut SqliteConnection, column: &'static str, value: Key, except_id: Option<i64>) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM students WHERE {} = ?1 AND (?2 IS NULL OR id <> ?2))",
        column
    );
    let query = sqlx::query_scalar::<_, bool>(&sql);
    let query = match value {
        Key::Id(value) => query.bind(value),
        Key::Text(value) => query.bind(value),
        Key::Level(value) => query.bind(value),
        Key::Status(value) => query.bind(value),
    };
    let found = query.bind(except_id).fetch_one(&mut *conn).await?;
    Ok(found)
}

async fn check_unique(conn: &mut SqliteConnection, student: &Student) -> Result<()> {
    if exists(conn, "registration_number", Key::Text(student.registration_number.clone()), student.id()).await? {
        return Err(ValidationError::DuplicateRegistrationNumber(student.registration_number.clone()).into());
    }
    if exists(conn, "email", Key::Text(student.email.clone()), student.id()).await? {
        return Err(ValidationError::DuplicateEmail(student.email.clone()).into());
    }
    if let Some(user_id) = student.user_id {
        if exists(conn, "user_id", Key::Id(user_id), student.id()).await? {
            return Err(ValidationError::DuplicateUserLink(user_id).into());
        }
        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        if !user_exists {
            return Err(ValidationError::UnknownReference { entity: "user", id: user_id }.into());
        }
    }
    Ok(())
}

async fn save_student(conn: &mut SqliteConnection, student: Student) -> Result<Student> {
    check_unique(conn, &student).await?;

    let saved = match student.id() {
        None => {
            sqlx::query_as::<_, Student>(
                r#"
                INSERT INTO students (registration_number, first_name, last_name, email, phone, date_of_birth,
                                      department, specialization, enrollment_year, academic_level, status, address, user_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                RETURNING *
                "#,
            )
            .bind(&student.registration_number)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(student.date_of_birth)
            .bind(&student.department)
            .bind(&student.specialization)
            .bind(student.enrollment_year)
            .bind(student.academic_level)
            .bind(student.status)
            .bind(&student.address)
            .bind(student.user_id)
            .fetch_one(&mut *conn)
            .await?
        }
        Some(id) => {
            let updated = sqlx::query_as::<_, Student>(
                r#"
                UPDATE students
                SET registration_number = ?2, first_name = ?3, last_name = ?4, email = ?5, phone = ?6,
                    date_of_birth = ?7, department = ?8, specialization = ?9, enrollment_year = ?10,
                    academic_level = ?11, status = ?12, address = ?13, user_id = ?14
                WHERE id = ?1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&student.registration_number)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(student.date_of_birth)
            .bind(&student.department)
            .bind(&student.specialization)
            .bind(student.enrollment_year)
            .bind(student.academic_level)
            .bind(student.status)
            .bind(&student.address)
            .bind(student.user_id)
            .fetch_optional(&mut *conn)
            .await?;

            updated.ok_or(ValidationError::UnknownReference { entity: "student", id })?
        }
    };

    let mut loaded = [saved];
    attach_to_students(conn, &mut loaded).await?;
    let [saved] = loaded;

    tracing::debug!(student_id = ?saved.id(), "Saved student");
    Ok(saved)
}

async fn delete_student(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    sqlx::query("DELETE FROM participations WHERE student_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let deleted = sqlx::query("DELETE FROM students WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
        > 0;

    if deleted {
        tracing::info!(student_id = id, "Deleted student");
    }
    Ok(deleted)
}
