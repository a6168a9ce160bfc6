//! Test database helper utilities
//!
//! Every `TestDatabase` is a fresh SQLite file inside its own temporary
//! directory, so tests are isolated without any cleanup step.

use std::sync::{Arc, Once};
use tempfile::TempDir;

use activity_tracker::config::Settings;
use activity_tracker::database::connection::{create_pool, run_migrations, DatabaseConfig};
use activity_tracker::database::{DatabasePool, DatabaseService};
use activity_tracker::services::{Notifier, ServiceFactory};
use activity_tracker::TrackerError;

use super::RecordingNotifier;

static INIT: Once = Once::new();

/// Test database helper that manages a temporary SQLite store
pub struct TestDatabase {
    pub pool: DatabasePool,
    pub service: DatabaseService,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a new test database with the schema applied
    pub async fn new() -> Result<Self, TrackerError> {
        // Initialize logging once
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        });

        let dir = tempfile::tempdir()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("tracker.db").display()),
            max_connections: 4,
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            service: DatabaseService::new(pool.clone()),
            pool,
            _dir: dir,
        })
    }

    /// Count rows of a table directly, bypassing the repositories
    pub async fn count_records(&self, table: &str) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar(&query).fetch_one(&self.pool).await
    }

    /// Service factory over this database with a recording notifier
    pub fn services(&self) -> (ServiceFactory, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
        let factory = ServiceFactory::new(test_settings(), self.service.clone(), dyn_notifier);
        (factory, notifier)
    }
}

/// Default settings with cheap password hashing
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.hash_memory_kib = 8;
    settings.auth.hash_iterations = 1;
    settings.auth.hash_parallelism = 1;
    settings
}
