use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{MessageRepository, QuizResultRepository, Storage, TaskRepository};

mod mapping;
mod message_repo;
mod migrate;
mod result_repo;
mod task_repo;

/// Private in-memory database; lives as long as the pool's single connection.
pub const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// `sqlite::memory:` is served by one connection that is never recycled, so
    /// every query sees the same database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or the
    /// connection pragmas fail.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        let options = if database_url == MEMORY_URL {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        };
        let pool = options
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo.clone());
        let tasks: Arc<dyn TaskRepository> = Arc::new(repo.clone());
        let messages: Arc<dyn MessageRepository> = Arc::new(repo);
        Ok(Self {
            results,
            tasks,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn plain_memory_url_keeps_one_database() {
        use crate::repository::TaskRepository;
        use tutor_core::model::TaskId;
        use tutor_core::time::fixed_now;

        let storage = Storage::sqlite(MEMORY_URL).await.unwrap();
        let id = TaskId::new("algebra-basics").unwrap();
        assert!(storage.tasks.mark_completed(&id, fixed_now()).await.unwrap());
        assert!(storage.tasks.is_completed(&id).await.unwrap());
    }
}
