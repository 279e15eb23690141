use std::sync::Arc;

use storage::repository::{MessageRepository, QuizResultRepository, Storage, TaskRepository};
use tracing::{debug, info, warn};
use tutor_core::model::{ChatMessage, QuizResult, ResultId, TaskId};

use crate::Clock;
use crate::config::DEFAULT_MESSAGE_CAP;
use crate::error::ProgressError;

/// Single owner of the learner's progress: result history, completed tasks
/// and chat history.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    results: Arc<dyn QuizResultRepository>,
    tasks: Arc<dyn TaskRepository>,
    messages: Arc<dyn MessageRepository>,
    message_cap: u32,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        results: Arc<dyn QuizResultRepository>,
        tasks: Arc<dyn TaskRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            clock,
            results,
            tasks,
            messages,
            message_cap: DEFAULT_MESSAGE_CAP,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.results),
            Arc::clone(&storage.tasks),
            Arc::clone(&storage.messages),
        )
    }

    /// Maximum number of chat messages retained. `0` disables the cap.
    #[must_use]
    pub fn with_message_cap(mut self, cap: u32) -> Self {
        self.message_cap = cap;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Append a result to the history. Attempts at the same quiz accumulate.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the result cannot be stored.
    pub async fn append_result(&self, result: &QuizResult) -> Result<ResultId, ProgressError> {
        let id = self.results.append_result(result).await?;
        info!(
            result_id = id,
            quiz_id = %result.quiz_id(),
            score = result.score(),
            "quiz result recorded"
        );
        Ok(id)
    }

    /// Mark a quiz or material as completed. Returns whether the id was newly
    /// added; a blank id is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn mark_task_completed(&self, id: &str) -> Result<bool, ProgressError> {
        let Ok(task_id) = TaskId::new(id) else {
            warn!(task_id = id, "ignoring completion for blank task id");
            return Ok(false);
        };
        let added = self.tasks.mark_completed(&task_id, self.clock.now()).await?;
        debug!(task_id = %task_id, added, "task marked completed");
        Ok(added)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn is_task_completed(&self, id: &TaskId) -> Result<bool, ProgressError> {
        Ok(self.tasks.is_completed(id).await?)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn completed_tasks(&self) -> Result<Vec<TaskId>, ProgressError> {
        Ok(self.tasks.list_completed().await?)
    }

    /// Append a chat message, evicting the oldest ones beyond the cap.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn append_message(&self, message: &ChatMessage) -> Result<(), ProgressError> {
        self.messages.append_message(message).await?;
        if self.message_cap > 0 {
            let evicted = self.messages.prune_messages(self.message_cap).await?;
            if evicted > 0 {
                debug!(evicted, cap = self.message_cap, "evicted old chat messages");
            }
        }
        Ok(())
    }

    /// Result history in append order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn results(&self) -> Result<Vec<QuizResult>, ProgressError> {
        Ok(self.results.list_results().await?)
    }

    /// Messages the learner has sent over the whole history, including ones
    /// already evicted by the cap.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn questions_asked(&self) -> Result<u64, ProgressError> {
        Ok(self.messages.user_message_total().await?)
    }

    /// Chat history in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>, ProgressError> {
        Ok(self.messages.list_messages().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{Author, MessageId, QuizId};
    use tutor_core::time::{fixed_clock, fixed_now};

    fn service(cap: u32) -> ProgressService {
        ProgressService::from_storage(fixed_clock(), &Storage::in_memory()).with_message_cap(cap)
    }

    fn message(text: &str) -> ChatMessage {
        ChatMessage::new(MessageId::random(), Author::User, text, fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn marking_twice_keeps_one_entry() {
        let progress = service(10);
        assert!(progress.mark_task_completed("algebra-basics").await.unwrap());
        assert!(!progress.mark_task_completed("algebra-basics").await.unwrap());

        let completed = progress.completed_tasks().await.unwrap();
        assert_eq!(completed, vec![TaskId::new("algebra-basics").unwrap()]);
        assert!(progress.is_task_completed(&completed[0]).await.unwrap());
    }

    #[tokio::test]
    async fn blank_task_id_is_ignored() {
        let progress = service(10);
        assert!(!progress.mark_task_completed("   ").await.unwrap());
        assert!(progress.completed_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_cap_evicts_oldest() {
        let progress = service(2);
        for text in ["a", "b", "c"] {
            progress.append_message(&message(text)).await.unwrap();
        }
        let texts: Vec<_> = progress
            .messages()
            .await
            .unwrap()
            .iter()
            .map(|m| m.text().to_owned())
            .collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn eviction_keeps_lifetime_question_count() {
        let progress = service(2);
        for text in ["a", "b", "c", "d"] {
            progress.append_message(&message(text)).await.unwrap();
        }
        assert_eq!(progress.messages().await.unwrap().len(), 2);
        assert_eq!(progress.questions_asked().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn zero_cap_keeps_everything() {
        let progress = service(0);
        for text in ["a", "b", "c"] {
            progress.append_message(&message(text)).await.unwrap();
        }
        assert_eq!(progress.messages().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn results_accumulate_in_order() {
        let progress = service(10);
        let quiz = QuizId::new("algebra-basics").unwrap();
        for correct in [1, 2] {
            let result = QuizResult::new(quiz.clone(), "Algebra", 2, correct, fixed_now()).unwrap();
            progress.append_result(&result).await.unwrap();
        }
        let scores: Vec<_> = progress
            .results()
            .await
            .unwrap()
            .iter()
            .map(QuizResult::score)
            .collect();
        assert_eq!(scores, vec![50, 100]);
    }
}
