use tutor_core::model::{QuizResult, ResultId};

use super::{SqliteRepository, mapping::map_result_row};
use crate::repository::{QuizResultRepository, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    quiz_id, quiz_title, score, total_questions, correct_answers, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.quiz_id().as_str())
        .bind(result.quiz_title())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.correct_answers()))
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT quiz_id, quiz_title, score, total_questions, correct_answers, completed_at
                FROM quiz_results
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
