//! Activity Tracker
//!
//! Main application entry point

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use activity_tracker::{
    config::Settings,
    database::{
        connection::{create_pool, run_migrations, DatabaseConfig},
        DatabaseService,
    },
    services::{LoggingNotifier, ServiceFactory},
    utils::{helpers::format_timestamp, logging},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", activity_tracker::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from_settings(&settings.database)).await?;
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);
    let services = ServiceFactory::new(settings.clone(), database_service, Arc::new(LoggingNotifier));

    let auth = services.auth_session();
    if let Some(admin) = auth.ensure_default_admin().await? {
        warn!(
            login = %admin.login,
            created_at = %format_timestamp(admin.created_at()),
            "Default admin created; change its password"
        );
    }

    if settings.seed.sample_data {
        services.seed_service.initialize_sample_data().await?;
    }

    let summary = services.statistics_service.summary().await?;
    println!("{}", summary);

    info!("Activity tracker finished");
    Ok(())
}
