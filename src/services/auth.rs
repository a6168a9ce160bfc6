//! Authentication service implementation
//!
//! This service handles credential checks, registration, password changes and
//! the reset-token flow. It holds the "current user" of one logical session,
//! so concurrent sessions each need their own instance.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::UserRepository;
use crate::models::{User, UserRole};
use crate::services::notification::NotificationService;
use crate::utils::errors::{AuthError, Result, TrackerError, ValidationError};
use crate::utils::logging::{log_account_action, log_auth_failure};
use crate::utils::validation::{require_text, validate_email};

/// Authentication service for one session
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    notifications: NotificationService,
    config: AuthConfig,
    current_user: Option<User>,
}

impl AuthService {
    /// Create a new AuthService instance with nobody logged in
    pub fn new(users: UserRepository, notifications: NotificationService, config: AuthConfig) -> Self {
        Self {
            users,
            notifications,
            config,
            current_user: None,
        }
    }

    /// Verify credentials and make the account the current user.
    ///
    /// On success `last_login` is stamped and persisted. Every failure is the
    /// same generic denial to the caller.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<User> {
        let Some(mut user) = self.users.find_by_login(login).await? else {
            return Err(deny(login, "login", AuthError::NotFound));
        };

        if !user.is_active() {
            return Err(deny(login, "login", AuthError::InactiveAccount));
        }

        if !self.verify_password(password, user.password_hash()) {
            return Err(deny(login, "login", AuthError::BadCredentials));
        }

        user.record_login(Utc::now());
        let user = self.users.save(&user).await?;

        log_account_action(&user.login, "login");
        self.current_user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current_user.take() {
            log_account_action(&user.login, "logout");
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(User::is_admin)
    }

    pub fn is_professor(&self) -> bool {
        self.current_user.as_ref().is_some_and(User::is_professor)
    }

    pub fn is_student(&self) -> bool {
        self.current_user.as_ref().is_some_and(User::is_student)
    }

    /// Create a new active account and send it a welcome email
    pub async fn register(&self, login: &str, password: &str, email: &str, role: UserRole) -> Result<User> {
        require_text("login", login)?;
        require_text("password", password)?;
        validate_email(email)?;

        if self.users.exists_by_login(login).await? {
            warn!(login = login, "Registration rejected: login already exists");
            return Err(ValidationError::DuplicateLogin(login.to_string()).into());
        }
        if self.users.exists_by_email(email).await? {
            warn!(email = email, "Registration rejected: email already exists");
            return Err(ValidationError::DuplicateEmail(email.to_string()).into());
        }

        let user = User::new(login, self.hash_password(password)?, email, role);
        let user = self.users.save(&user).await?;
        log_account_action(&user.login, "register");

        if let Err(e) = self.notifications.send_welcome(&user.email, &user.login) {
            warn!(login = %user.login, error = %e, "Welcome email not sent");
        }

        Ok(user)
    }

    /// Replace the current user's password after checking the old one.
    ///
    /// The account is re-read first: the old password is verified against the
    /// stored hash, not the copy cached at login, and only the hash is written.
    pub async fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        require_text("password", new_password)?;

        let Some(id) = self.current_user.as_ref().and_then(User::id) else {
            return Err(deny("-", "change_password", AuthError::NotLoggedIn));
        };

        let Some(mut user) = self.users.find_by_id(id).await? else {
            self.current_user = None;
            return Err(deny("-", "change_password", AuthError::NotFound));
        };

        if !user.is_active() {
            return Err(deny(&user.login, "change_password", AuthError::InactiveAccount));
        }

        if !self.verify_password(old_password, user.password_hash()) {
            return Err(deny(&user.login, "change_password", AuthError::BadCredentials));
        }

        let password_hash = self.hash_password(new_password)?;
        if !self.users.update_password_hash(id, &password_hash).await? {
            self.current_user = None;
            return Err(deny(&user.login, "change_password", AuthError::NotFound));
        }
        user.set_password_hash(password_hash);

        log_account_action(&user.login, "change_password");
        self.current_user = Some(user);
        Ok(())
    }

    /// Issue a reset token for the account owning `email`.
    ///
    /// Returns `None` for an unknown address; the caller is expected to
    /// deliver the token out of band.
    pub async fn generate_reset_token(&self, email: &str) -> Result<Option<String>> {
        let Some(mut user) = self.users.find_by_email(email).await? else {
            log_auth_failure(email, "generate_reset_token", AuthError::NotFound.reason());
            return Ok(None);
        };

        let expiry = Duration::try_hours(self.config.reset_token_ttl_hours)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                TrackerError::Config(format!(
                    "Reset token TTL of {} hours is out of range",
                    self.config.reset_token_ttl_hours
                ))
            })?;

        let token = Uuid::new_v4().to_string();
        user.set_reset_token(token.clone(), expiry);
        self.users.save(&user).await?;

        log_account_action(&user.login, "generate_reset_token");
        Ok(Some(token))
    }

    /// Issue a reset token and email it. Unknown addresses are ignored
    /// silently so the caller cannot learn which accounts exist.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        if let Some(token) = self.generate_reset_token(email).await? {
            if let Err(e) = self.notifications.send_password_reset(email, &token) {
                warn!(error = %e, "Password reset email not sent");
            }
        }
        Ok(())
    }

    /// Consume a reset token: set the new password and clear the token
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        require_text("password", new_password)?;

        let Some(mut user) = self.users.find_by_reset_token(token).await? else {
            return Err(deny("-", "reset_password", AuthError::InvalidToken));
        };

        if !user.is_reset_token_valid(Utc::now()) {
            return Err(deny(&user.login, "reset_password", AuthError::ExpiredToken));
        }

        user.set_password_hash(self.hash_password(new_password)?);
        user.clear_reset_token();
        self.users.save(&user).await?;

        log_account_action(&user.login, "reset_password");
        Ok(())
    }

    /// Create the configured admin account when no user exists yet
    pub async fn ensure_default_admin(&self) -> Result<Option<User>> {
        let Some(admin) = self.config.default_admin.as_ref() else {
            debug!("No default admin configured");
            return Ok(None);
        };

        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let user = self
            .register(&admin.login, &admin.password, &admin.email, UserRole::Admin)
            .await?;
        info!(login = %user.login, "Default admin user created");
        Ok(Some(user))
    }

    /// Salted Argon2id hash in PHC string form
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| TrackerError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Re-derive and compare; a malformed stored hash never verifies
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        // Cost parameters are read from the PHC string itself
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.hash_memory_kib,
            self.config.hash_iterations,
            self.config.hash_parallelism,
            None,
        )
        .map_err(|e| TrackerError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Log the specific reason and return the generic denial
fn deny(subject: &str, action: &str, reason: AuthError) -> TrackerError {
    log_auth_failure(subject, action, reason.reason());
    TrackerError::Auth(reason)
}
