use chrono::{DateTime, Utc};
use sqlx::Row;
use tutor_core::model::TaskId;

use super::SqliteRepository;
use crate::repository::{StorageError, TaskRepository};

#[async_trait::async_trait]
impl TaskRepository for SqliteRepository {
    async fn mark_completed(&self, id: &TaskId, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO completed_tasks (task_id, completed_at)
                VALUES (?1, ?2)
                ON CONFLICT(task_id) DO NOTHING
            ",
        )
        .bind(id.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() > 0)
    }

    async fn is_completed(&self, id: &TaskId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM completed_tasks WHERE task_id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn list_completed(&self) -> Result<Vec<TaskId>, StorageError> {
        let rows = sqlx::query("SELECT task_id FROM completed_tasks ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let raw: String = row
                    .try_get("task_id")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                TaskId::new(raw).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }
}
