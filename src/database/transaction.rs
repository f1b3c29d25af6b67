use futures::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;

#[derive(Debug)]
pub struct DatabaseTransaction;

impl DatabaseTransaction {
    /// Run a closure inside a write transaction.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE`, so the write lock is
    /// taken before the closure reads anything and concurrent writers queue
    /// behind it instead of failing on lock upgrade. Dropping the returned
    /// future before it completes rolls the transaction back.
    pub async fn run<T, F>(pool: &SqlitePool, f: F) -> Result<T, AppError>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, AppError>>,
        T: Send,
    {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Transaction failed with error: {}, rolling back", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "Rollback failed after error (orig: {}, rollback: {})",
                        err,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::database::init_database;

    async fn pool() -> (TempDir, SqlitePool) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}/tx.db", dir.path().display());
        let pool = init_database(&url).await.unwrap();
        (dir, pool)
    }

    async fn department_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM departments")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn insert_department(conn: &mut SqliteConnection) -> Result<(), AppError> {
        sqlx::query("INSERT INTO departments (id, name, department_type) VALUES (?, 'Finance', 'DAF')")
            .bind(uuid::Uuid::new_v4())
            .execute(conn)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn errors_roll_back() {
        let (_dir, pool) = pool().await;

        let result: Result<(), AppError> = DatabaseTransaction::run(&pool, |conn| {
            Box::pin(async move {
                insert_department(&mut *conn).await?;
                Err(AppError::BadRequest("nope".to_string()))
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(department_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn abandoned_transaction_releases_the_write_lock() {
        let (_dir, pool) = pool().await;

        let stalled = tokio::time::timeout(
            Duration::from_millis(200),
            DatabaseTransaction::run(&pool, |conn| {
                Box::pin(async move {
                    insert_department(&mut *conn).await?;
                    std::future::pending::<()>().await;
                    Ok(())
                })
            }),
        )
        .await;
        assert!(stalled.is_err());

        for _ in 0..3 {
            DatabaseTransaction::run(&pool, |conn| Box::pin(insert_department(conn)))
                .await
                .unwrap();
        }
        assert_eq!(department_count(&pool).await, 3);
    }
}
