use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tutor_core::model::{
    Author, ChatMessage, Difficulty, MessageId, QuizId, QuizResult, TaskId, TaskKind,
    TaskSuggestion,
};
use uuid::Uuid;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    let quiz_id = QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?).map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;

    QuizResult::from_persisted(
        quiz_id,
        row.try_get::<String, _>("quiz_title").map_err(ser)?,
        i64_to_u32("score", row.try_get("score").map_err(ser)?)?,
        i64_to_u32("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        i64_to_u32("correct_answers", row.try_get("correct_answers").map_err(ser)?)?,
        completed_at,
    )
    .map_err(ser)
}

/// JSON shape of a task suggestion attached to a stored message.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    kind: String,
    title: String,
    description: String,
    category: String,
    difficulty: String,
    estimated_time: String,
}

pub(crate) fn task_to_json(task: &TaskSuggestion) -> Result<String, StorageError> {
    let record = TaskRecord {
        id: task.task_id.clone(),
        kind: task.kind.as_str().to_owned(),
        title: task.title.clone(),
        description: task.description.clone(),
        category: task.category.clone(),
        difficulty: task.difficulty.as_str().to_owned(),
        estimated_time: task.estimated_time.clone(),
    };
    serde_json::to_string(&record).map_err(ser)
}

fn task_from_json(json: &str) -> Result<TaskSuggestion, StorageError> {
    let record: TaskRecord = serde_json::from_str(json).map_err(ser)?;
    Ok(TaskSuggestion {
        task_id: record.id,
        kind: TaskKind::parse(&record.kind).map_err(ser)?,
        title: record.title,
        description: record.description,
        category: record.category,
        difficulty: record.difficulty.parse::<Difficulty>().map_err(ser)?,
        estimated_time: record.estimated_time,
    })
}

pub(crate) fn map_message_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage, StorageError> {
    let id_str: String = row.try_get("id").map_err(ser)?;
    let id = MessageId::from_uuid(Uuid::parse_str(&id_str).map_err(ser)?);
    let author = Author::parse(&row.try_get::<String, _>("author").map_err(ser)?).map_err(ser)?;
    let sent_at: DateTime<Utc> = row.try_get("sent_at").map_err(ser)?;

    let message = ChatMessage::new(
        id,
        author,
        row.try_get::<String, _>("text").map_err(ser)?,
        sent_at,
    )
    .map_err(ser)?;

    match row.try_get::<Option<String>, _>("task").map_err(ser)? {
        Some(json) => Ok(message.with_task(task_from_json(&json)?)),
        None => Ok(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_json_round_trips() {
        let task = TaskSuggestion {
            task_id: TaskId::new("newton-laws").unwrap(),
            kind: TaskKind::Quiz,
            title: "Newton's Laws".into(),
            description: "Forces".into(),
            category: "Physics".into(),
            difficulty: Difficulty::Intermediate,
            estimated_time: "15 min".into(),
        };
        let json = task_to_json(&task).unwrap();
        assert!(json.contains("\"estimatedTime\":\"15 min\""));
        assert_eq!(task_from_json(&json).unwrap(), task);
    }

    #[test]
    fn unknown_task_kind_is_a_serialization_error() {
        let json = r#"{"id":"x","kind":"podcast","title":"t","description":"","category":"c","difficulty":"Beginner","estimatedTime":"1 min"}"#;
        assert!(matches!(
            task_from_json(json).unwrap_err(),
            StorageError::Serialization(_)
        ));
    }
}
