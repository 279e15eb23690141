use tutor_core::model::ChatMessage;

use super::{
    SqliteRepository,
    mapping::{map_message_row, task_to_json},
};
use crate::repository::{MessageRepository, StorageError};

#[async_trait::async_trait]
impl MessageRepository for SqliteRepository {
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StorageError> {
        let task = message.task().map(task_to_json).transpose()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
                INSERT INTO chat_messages (id, author, text, sent_at, task)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(message.id().value().to_string())
        .bind(message.author().as_str())
        .bind(message.text())
        .bind(message.sent_at())
        .bind(task)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        if message.is_user() {
            sqlx::query(
                r"
                    UPDATE chat_counters SET value = value + 1
                    WHERE name = 'user_messages'
                ",
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, author, text, sent_at, task
                FROM chat_messages
                ORDER BY seq ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_message_row(&row)?);
        }
        Ok(out)
    }

    async fn prune_messages(&self, keep: u32) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
                DELETE FROM chat_messages
                WHERE seq NOT IN (
                    SELECT seq FROM chat_messages ORDER BY seq DESC LIMIT ?1
                )
            ",
        )
        .bind(i64::from(keep))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected())
    }

    async fn user_message_total(&self) -> Result<u64, StorageError> {
        let total: i64 =
            sqlx::query_scalar("SELECT value FROM chat_counters WHERE name = 'user_messages'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?
                .unwrap_or(0);
        u64::try_from(total).map_err(|_| StorageError::Serialization("negative counter".into()))
    }
}
