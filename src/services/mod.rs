//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod notification;
pub mod seed;
pub mod statistics;

// Re-export commonly used services
pub use auth::AuthService;
pub use notification::{LoggingNotifier, MessageTemplate, NotificationService, Notifier, OutboundEmail};
pub use seed::{SeedReport, SeedService};
pub use statistics::{ActivityReport, StatisticsService, StatisticsSummary, StudentReport};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub statistics_service: StatisticsService,
    pub notification_service: NotificationService,
    pub seed_service: SeedService,
    settings: Settings,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: Settings, database: DatabaseService, notifier: Arc<dyn Notifier>) -> Self {
        let statistics_service = StatisticsService::new(
            database.activities.clone(),
            database.students.clone(),
            database.participations.clone(),
        );
        let notification_service = NotificationService::new(notifier, settings.auth.reset_token_ttl_hours);
        let seed_service = SeedService::new(database.clone());

        Self {
            database,
            statistics_service,
            notification_service,
            seed_service,
            settings,
        }
    }

    /// A fresh authentication session with nobody logged in.
    ///
    /// Each logical session owns its own instance.
    pub fn auth_session(&self) -> AuthService {
        AuthService::new(
            self.database.users.clone(),
            self.notification_service.clone(),
            self.settings.auth.clone(),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
