use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{ChatMessage, QuizResult, ResultId, TaskId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Append-only history of completed quiz attempts.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result. Repeated attempts at the same quiz accumulate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError>;

    /// All results in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError>;
}

/// Set of completed quiz/material ids.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Mark a task as completed. Returns `false` if it already was.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the marker cannot be stored.
    async fn mark_completed(&self, id: &TaskId, at: DateTime<Utc>) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn is_completed(&self, id: &TaskId) -> Result<bool, StorageError>;

    /// Completed ids in the order they were first marked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_completed(&self) -> Result<Vec<TaskId>, StorageError>;
}

/// Tutor conversation history.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a message with the same id exists.
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StorageError>;

    /// All messages in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_messages(&self) -> Result<Vec<ChatMessage>, StorageError>;

    /// Drop the oldest messages so that at most `keep` remain. Returns how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn prune_messages(&self, keep: u32) -> Result<u64, StorageError>;

    /// Messages ever sent by the learner. Pruning does not lower this count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn user_message_total(&self) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<Mutex<Vec<QuizResult>>>,
    tasks: Arc<Mutex<Vec<TaskId>>>,
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    user_messages: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        guard.push(result.clone());
        ResultId::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn mark_completed(&self, id: &TaskId, _at: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut guard = self.tasks.lock().map_err(poisoned)?;
        if guard.contains(id) {
            return Ok(false);
        }
        guard.push(id.clone());
        Ok(true)
    }

    async fn is_completed(&self, id: &TaskId) -> Result<bool, StorageError> {
        let guard = self.tasks.lock().map_err(poisoned)?;
        Ok(guard.contains(id))
    }

    async fn list_completed(&self) -> Result<Vec<TaskId>, StorageError> {
        let guard = self.tasks.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl MessageRepository for InMemoryRepository {
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StorageError> {
        let mut guard = self.messages.lock().map_err(poisoned)?;
        if guard.iter().any(|m| m.id() == message.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(message.clone());
        if message.is_user() {
            self.user_messages.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let guard = self.messages.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn prune_messages(&self, keep: u32) -> Result<u64, StorageError> {
        let mut guard = self.messages.lock().map_err(poisoned)?;
        let keep = usize::try_from(keep).unwrap_or(usize::MAX);
        let excess = guard.len().saturating_sub(keep);
        guard.drain(..excess);
        Ok(excess as u64)
    }

    async fn user_message_total(&self) -> Result<u64, StorageError> {
        Ok(self.user_messages.load(Ordering::Relaxed))
    }
}

/// Aggregates the progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn QuizResultRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo.clone());
        let tasks: Arc<dyn TaskRepository> = Arc::new(repo.clone());
        let messages: Arc<dyn MessageRepository> = Arc::new(repo);
        Self {
            results,
            tasks,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{Author, MessageId, QuizId};
    use tutor_core::time::fixed_now;

    fn result(quiz: &str, score: u32) -> QuizResult {
        QuizResult::from_persisted(QuizId::new(quiz).unwrap(), "Quiz", score, 4, score / 25, fixed_now())
            .unwrap()
    }

    fn message(text: &str) -> ChatMessage {
        ChatMessage::new(MessageId::random(), Author::User, text, fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn repeated_attempts_accumulate() {
        let repo = InMemoryRepository::new();
        repo.append_result(&result("q1", 50)).await.unwrap();
        repo.append_result(&result("q1", 75)).await.unwrap();

        let scores: Vec<_> = repo
            .list_results()
            .await
            .unwrap()
            .iter()
            .map(QuizResult::score)
            .collect();
        assert_eq!(scores, vec![50, 75]);
    }

    #[tokio::test]
    async fn marking_is_idempotent() {
        let repo = InMemoryRepository::new();
        let id = TaskId::new("physics-1").unwrap();

        assert!(repo.mark_completed(&id, fixed_now()).await.unwrap());
        assert!(!repo.mark_completed(&id, fixed_now()).await.unwrap());
        assert_eq!(repo.list_completed().await.unwrap(), vec![id.clone()]);
        assert!(repo.is_completed(&id).await.unwrap());
    }

    #[tokio::test]
    async fn prune_keeps_newest_messages() {
        let repo = InMemoryRepository::new();
        for text in ["one", "two", "three"] {
            repo.append_message(&message(text)).await.unwrap();
        }

        assert_eq!(repo.prune_messages(2).await.unwrap(), 1);
        let texts: Vec<_> = repo
            .list_messages()
            .await
            .unwrap()
            .iter()
            .map(|m| m.text().to_owned())
            .collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(repo.user_message_total().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_message_id_conflicts() {
        let repo = InMemoryRepository::new();
        let msg = message("hello");
        repo.append_message(&msg).await.unwrap();
        let err = repo.append_message(&msg).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.user_message_total().await.unwrap(), 1);
    }
}
