//! Notification service implementation
//!
//! This service renders the account emails (password reset and welcome) from
//! templates and hands them to a [`Notifier`]. Delivery is fire-and-forget:
//! the caller never learns whether the message arrived.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::utils::errors::{Result, ValidationError};

pub const PASSWORD_RESET_TEMPLATE: &str = "password_reset";
pub const WELCOME_TEMPLATE: &str = "welcome";

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Message template structure. Placeholders are written `{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub key: String,
    pub subject: String,
    pub body: String,
}

/// Outbound delivery collaborator
pub trait Notifier: Send + Sync {
    fn deliver(&self, email: &OutboundEmail);
}

/// Writes every message to the log instead of sending it
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn deliver(&self, email: &OutboundEmail) {
        info!(to = %email.to, subject = %email.subject, body = %email.body, "Outbound email");
    }
}

/// Renders templates and passes the result to the configured notifier
#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    templates: HashMap<String, MessageTemplate>,
    reset_token_ttl_hours: i64,
}

impl fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationService")
            .field("templates", &self.template_keys())
            .field("reset_token_ttl_hours", &self.reset_token_ttl_hours)
            .finish()
    }
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(notifier: Arc<dyn Notifier>, reset_token_ttl_hours: i64) -> Self {
        Self {
            notifier,
            templates: Self::load_default_templates(),
            reset_token_ttl_hours,
        }
    }

    /// Send the reset code for an account
    pub fn send_password_reset(&self, to: &str, token: &str) -> Result<()> {
        let mut parameters = HashMap::new();
        parameters.insert("token".to_string(), token.to_string());
        parameters.insert("ttl_hours".to_string(), self.reset_token_ttl_hours.to_string());
        self.send(PASSWORD_RESET_TEMPLATE, to, &parameters)
    }

    /// Greet a newly registered account
    pub fn send_welcome(&self, to: &str, login: &str) -> Result<()> {
        let mut parameters = HashMap::new();
        parameters.insert("login".to_string(), login.to_string());
        self.send(WELCOME_TEMPLATE, to, &parameters)
    }

    /// Render `template_key` and hand it to the notifier
    pub fn send(&self, template_key: &str, to: &str, parameters: &HashMap<String, String>) -> Result<()> {
        let email = self.render(template_key, to, parameters)?;
        debug!(to = %email.to, template_key = template_key, "Delivering notification");
        self.notifier.deliver(&email);
        Ok(())
    }

    /// Render a template without sending it
    pub fn render(
        &self,
        template_key: &str,
        to: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<OutboundEmail> {
        let template = self
            .templates
            .get(template_key)
            .ok_or_else(|| ValidationError::Invalid(format!("Template not found: {}", template_key)))?;

        Ok(OutboundEmail {
            to: to.to_string(),
            subject: fill(&template.subject, parameters),
            body: fill(&template.body, parameters),
        })
    }

    /// Add or replace a template
    pub fn add_template(&mut self, template: MessageTemplate) {
        self.templates.insert(template.key.clone(), template);
    }

    pub fn template_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.templates.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn load_default_templates() -> HashMap<String, MessageTemplate> {
        let mut templates = HashMap::new();

        templates.insert(
            PASSWORD_RESET_TEMPLATE.to_string(),
            MessageTemplate {
                key: PASSWORD_RESET_TEMPLATE.to_string(),
                subject: "Password reset - Activity Tracker".to_string(),
                body: "Hello,\n\n\
                       A password reset was requested for your account.\n\n\
                       Use the following code to choose a new password:\n\n\
                       Code: {token}\n\n\
                       This code is valid for {ttl_hours} hours.\n\n\
                       If you did not request this reset, you can ignore this email.\n\n\
                       The Activity Tracker team"
                    .to_string(),
            },
        );

        templates.insert(
            WELCOME_TEMPLATE.to_string(),
            MessageTemplate {
                key: WELCOME_TEMPLATE.to_string(),
                subject: "Welcome - Activity Tracker".to_string(),
                body: "Hello {login},\n\n\
                       Welcome to the educational activity tracker.\n\n\
                       Your account has been created. You can now sign in with your login.\n\n\
                       The Activity Tracker team"
                    .to_string(),
            },
        );

        templates
    }
}

fn fill(text: &str, parameters: &HashMap<String, String>) -> String {
    let mut formatted = text.to_string();
    for (key, value) in parameters {
        let placeholder = format!("{{{}}}", key);
        formatted = formatted.replace(&placeholder, value);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<OutboundEmail>>);

    impl Notifier for Capture {
        fn deliver(&self, email: &OutboundEmail) {
            self.0.lock().unwrap().push(email.clone());
        }
    }

    #[test]
    fn test_password_reset_email() {
        let capture = Arc::new(Capture::default());
        let service = NotificationService::new(capture.clone(), 24);

        service.send_password_reset("prof@universite.ma", "abc-123").unwrap();

        let sent = capture.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "prof@universite.ma");
        assert!(sent[0].body.contains("Code: abc-123"));
        assert!(sent[0].body.contains("valid for 24 hours"));
    }

    #[test]
    fn test_welcome_email() {
        let service = NotificationService::new(Arc::new(LoggingNotifier), 24);
        let email = service
            .render(WELCOME_TEMPLATE, "new@universite.ma", &HashMap::from([("login".to_string(), "newbie".to_string())]))
            .unwrap();
        assert!(email.body.starts_with("Hello newbie,"));
        assert!(service.send_welcome("new@universite.ma", "newbie").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let service = NotificationService::new(Arc::new(LoggingNotifier), 24);
        assert!(service.send("missing", "x@universite.ma", &HashMap::new()).is_err());
    }

    #[test]
    fn test_template_management() {
        let mut service = NotificationService::new(Arc::new(LoggingNotifier), 24);
        service.add_template(MessageTemplate {
            key: "reminder".to_string(),
            subject: "Deadline for {title}".to_string(),
            body: "Due on {deadline}".to_string(),
        });
        assert_eq!(service.template_keys(), vec!["password_reset", "reminder", "welcome"]);
    }
}
