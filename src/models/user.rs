//! User account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::ValidationError;
use crate::utils::validation::{require_text, validate_email};

/// Login account. The password is only ever held as a salted hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    id: Option<i64>,
    pub login: String,
    #[serde(skip_serializing)]
    password_hash: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
}

impl User {
    /// New active account; `password_hash` must already be hashed
    pub fn new(
        login: impl Into<String>,
        password_hash: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: None,
            login: login.into(),
            password_hash: password_hash.into(),
            email: email.into(),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            last_login: None,
            reset_token: None,
            reset_token_expiry: None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    pub fn reset_token(&self) -> Option<&str> {
        self.reset_token.as_deref()
    }

    pub fn reset_token_expiry(&self) -> Option<DateTime<Utc>> {
        self.reset_token_expiry
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login = Some(at);
    }

    pub fn set_reset_token(&mut self, token: impl Into<String>, expiry: DateTime<Utc>) {
        self.reset_token = Some(token.into());
        self.reset_token_expiry = Some(expiry);
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_token = None;
        self.reset_token_expiry = None;
    }

    /// A token is usable strictly before its expiry
    pub fn is_reset_token_valid(&self, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiry) {
            (Some(_), Some(expiry)) => now < expiry,
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_professor(&self) -> bool {
        self.role == UserRole::Professor
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("login", &self.login)?;
        require_text("password", &self.password_hash)?;
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Professor,
    Student,
}

impl UserRole {
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Professor => "Professor",
            UserRole::Student => "Student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
            UserStatus::Suspended => "Suspended",
        }
    }
}
