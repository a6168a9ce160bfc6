//! Transactional store gateway
//!
//! Every repository operation runs as exactly one unit-of-work opened here.
//! Bodies receive the connection of a fresh transaction and return a boxed
//! future borrowing it, the same shape as `sqlx::Connection::transaction`.

use futures::future::BoxFuture;
use sqlx::SqliteConnection;
use std::time::Instant;
use tracing::{error, warn};

use crate::database::DatabasePool;
use crate::utils::errors::{Result, TrackerError};
use crate::utils::logging::log_database_operation;

#[derive(Debug, Clone)]
pub struct StoreGateway {
    pool: DatabasePool,
}

impl StoreGateway {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Run `body` in a read-write unit-of-work.
    ///
    /// Commits when the body succeeds. Otherwise the transaction is rolled
    /// back, the failure is logged with `operation` and returned unchanged.
    pub async fn execute_transaction<T, F>(&self, operation: &'static str, body: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let started = Instant::now();

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return Err(self.failed(operation, started, e.into())),
        };

        match body(&mut *tx).await {
            Ok(value) => match tx.commit().await {
                Ok(()) => {
                    log_database_operation(operation, elapsed_ms(started), true);
                    Ok(value)
                }
                Err(e) => Err(self.failed(operation, started, e.into())),
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(operation = operation, error = ?rollback_err, "Rollback failed");
                }
                Err(self.failed(operation, started, err))
            }
        }
    }

    /// Run `body` in a read-only unit-of-work.
    ///
    /// The transaction is always rolled back, so nothing the body does can
    /// outlive the call.
    pub async fn execute_query<T, F>(&self, operation: &'static str, body: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let started = Instant::now();

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return Err(self.failed(operation, started, e.into())),
        };

        let outcome = body(&mut *tx).await;

        if let Err(rollback_err) = tx.rollback().await {
            warn!(operation = operation, error = ?rollback_err, "Releasing read scope failed");
        }

        match outcome {
            Ok(value) => {
                log_database_operation(operation, elapsed_ms(started), true);
                Ok(value)
            }
            Err(err) => Err(self.failed(operation, started, err)),
        }
    }

    fn failed(&self, operation: &'static str, started: Instant, err: TrackerError) -> TrackerError {
        log_database_operation(operation, elapsed_ms(started), false);
        match &err {
            TrackerError::Transaction(source) => {
                error!(operation = operation, error = ?source, "Unit of work rolled back");
            }
            other => {
                warn!(operation = operation, error = %other, "Unit of work rejected");
            }
        }
        err
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::{create_pool, run_migrations, DatabaseConfig};
    use crate::utils::errors::ValidationError;
    use assert_matches::assert_matches;

    async fn gateway() -> StoreGateway {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        StoreGateway::new(pool)
    }

    async fn insert_and_fail(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO activities (title, created_at, status, activity_type) VALUES ('Doomed', '2025-01-01 00:00:00+00:00', 'PLANNED', 'QUIZ')",
        )
        .execute(&mut *conn)
        .await?;
        Err(ValidationError::Invalid("abort".to_string()).into())
    }

    async fn count_activities(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    #[tokio::test]
    async fn test_failed_body_is_rolled_back() {
        let gateway = gateway().await;

        let result = gateway
            .execute_transaction("test.insert_and_fail", |conn| Box::pin(insert_and_fail(conn)))
            .await;
        assert_matches!(result, Err(TrackerError::Validation(ValidationError::Invalid(_))));

        let count = gateway
            .execute_query("test.count", |conn| Box::pin(count_activities(conn)))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_store_error_surfaces_as_transaction_failure() {
        let gateway = gateway().await;

        let result: Result<u64> = gateway
            .execute_transaction("test.bad_sql", |conn| {
                Box::pin(async move {
                    let done = sqlx::query("INSERT INTO no_such_table VALUES (1)")
                        .execute(&mut *conn)
                        .await?;
                    Ok(done.rows_affected())
                })
            })
            .await;

        let err = result.unwrap_err();
        assert_matches!(err, TrackerError::Transaction(_));
        assert_eq!(err.to_string(), "Store operation failed");
    }
}
