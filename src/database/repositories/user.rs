//! User repository implementation

use sqlx::SqliteConnection;

use crate::database::gateway::StoreGateway;
use crate::models::{User, UserRole, UserStatus};
use crate::utils::errors::{Result, ValidationError};

const ORDER_NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

#[derive(Debug, Clone)]
pub struct UserRepository {
    gateway: StoreGateway,
}

impl UserRepository {
    pub fn new(gateway: StoreGateway) -> Self {
        Self { gateway }
    }

    /// Insert or update a user. Login and email must stay unique.
    pub async fn save(&self, user: &User) -> Result<User> {
        user.validate()?;
        let user = user.clone();
        self.gateway
            .execute_transaction("user.save", move |conn| Box::pin(save_user(conn, user)))
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.find_one("user.find_by_id", "id = ?1", Key::Id(id)).await
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.find_one("user.find_by_login", "login = ?1", Key::Text(login.to_string()))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("user.find_by_email", "email = ?1", Key::Text(email.to_string()))
            .await
    }

    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        self.find_one("user.find_by_reset_token", "reset_token = ?1", Key::Text(token.to_string()))
            .await
    }

    /// All users, most recently created first
    pub async fn find_all(&self) -> Result<Vec<User>> {
        self.find_many("user.find_all", "1 = 1", None).await
    }

    pub async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        self.find_many("user.find_by_role", "role = ?1", Some(Key::Role(role))).await
    }

    pub async fn find_by_status(&self, status: UserStatus) -> Result<Vec<User>> {
        self.find_many("user.find_by_status", "status = ?1", Some(Key::Status(status)))
            .await
    }

    pub async fn exists_by_login(&self, login: &str) -> Result<bool> {
        let login = login.to_string();
        self.gateway
            .execute_query("user.exists_by_login", move |conn| {
                Box::pin(exists(conn, "login", login, None))
            })
            .await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let email = email.to_string();
        self.gateway
            .execute_query("user.exists_by_email", move |conn| {
                Box::pin(exists(conn, "email", email, None))
            })
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.gateway
            .execute_query("user.count", |conn| {
                Box::pin(async move {
                    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(count)
                })
            })
            .await
    }

    /// Overwrite only the password hash of an existing account.
    ///
    /// Returns false when no such user exists. Every other column is left as
    /// stored, so a concurrent status change survives.
    pub async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let password_hash = password_hash.to_string();
        self.gateway
            .execute_transaction("user.update_password_hash", move |conn| {
                Box::pin(async move {
                    let done = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
                        .bind(id)
                        .bind(password_hash)
                        .execute(&mut *conn)
                        .await?;
                    Ok(done.rows_affected() > 0)
                })
            })
            .await
    }

    /// Delete a user; a student linked to it keeps existing, unlinked.
    ///
    /// Returns false when the user has no identity or no longer exists.
    pub async fn delete(&self, user: &User) -> Result<bool> {
        let Some(id) = user.id() else {
            return Ok(false);
        };
        self.gateway
            .execute_transaction("user.delete", move |conn| Box::pin(delete_user(conn, id)))
            .await
    }

    async fn find_one(&self, operation: &'static str, condition: &'static str, key: Key) -> Result<Option<User>> {
        let mut found = self.find_many(operation, condition, Some(key)).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    async fn find_many(&self, operation: &'static str, condition: &'static str, key: Option<Key>) -> Result<Vec<User>> {
        self.gateway
            .execute_query(operation, move |conn| Box::pin(fetch(conn, condition, key)))
            .await
    }
}

enum Key {
    Id(i64),
    Text(String),
    Role(UserRole),
    Status(UserStatus),
}

async fn fetch(conn: &mut SqliteConnection, condition: &'static str, key: Option<Key>) -> Result<Vec<User>> {
    let sql = format!("SELECT * FROM users WHERE {}{}", condition, ORDER_NEWEST_FIRST);
    let query = sqlx::query_as::<_, User>(&sql);
    let query = match key {
        Some(Key::Id(value)) => query.bind(value),
        Some(Key::Text(value)) => query.bind(value),
        Some(Key::Role(value)) => query.bind(value),
        Some(Key::Status(value)) => query.bind(value),
        None => query,
    };
    Ok(query.fetch_all(&mut *conn).await?)
}

async fn exists(conn: &mut SqliteConnection, column: &'static str, value: String, except_id: Option<i64>) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM users WHERE {} = ?1 AND (?2 IS NULL OR id <> ?2))",
        column
    );
    let found: bool = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(except_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found)
}

async fn save_user(conn: &mut SqliteConnection, user: User) -> Result<User> {
    if exists(conn, "login", user.login.clone(), user.id()).await? {
        return Err(ValidationError::DuplicateLogin(user.login.clone()).into());
    }
    if exists(conn, "email", user.email.clone(), user.id()).await? {
        return Err(ValidationError::DuplicateEmail(user.email.clone()).into());
    }

    let saved = match user.id() {
        None => {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (login, password_hash, email, role, status, created_at, last_login, reset_token, reset_token_expiry)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                RETURNING *
                "#,
            )
            .bind(&user.login)
            .bind(user.password_hash())
            .bind(&user.email)
            .bind(user.role)
            .bind(user.status)
            .bind(user.created_at())
            .bind(user.last_login())
            .bind(user.reset_token())
            .bind(user.reset_token_expiry())
            .fetch_one(&mut *conn)
            .await?
        }
        Some(id) => {
            // created_at is set once and never rewritten
            let updated = sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET login = ?2, password_hash = ?3, email = ?4, role = ?5, status = ?6,
                    last_login = ?7, reset_token = ?8, reset_token_expiry = ?9
                WHERE id = ?1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&user.login)
            .bind(user.password_hash())
            .bind(&user.email)
            .bind(user.role)
            .bind(user.status)
            .bind(user.last_login())
            .bind(user.reset_token())
            .bind(user.reset_token_expiry())
            .fetch_optional(&mut *conn)
            .await?;

            updated.ok_or(ValidationError::UnknownReference { entity: "user", id })?
        }
    };

    Ok(saved)
}

async fn delete_user(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    sqlx::query("UPDATE students SET user_id = NULL WHERE user_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
        > 0;

    if deleted {
        tracing::info!(user_id = id, "Deleted user");
    }
    Ok(deleted)
}
