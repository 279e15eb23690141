use std::sync::Arc;

use storage::catalog::CatalogRepository;
use tracing::{debug, warn};
use tutor_core::model::{AttemptId, QuizId, QuizResult, ResultId};
use tutor_core::{Advance, FlowTick, QuizFlow, QuizFlowError};

use super::view::{QuizView, ResultView};
use crate::Clock;
use crate::error::QuizServiceError;
use crate::progress_service::ProgressService;

/// A finished attempt after it reached the progress store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedQuiz {
    pub result_id: ResultId,
    pub result: QuizResult,
    /// First completion of this quiz.
    pub newly_completed: bool,
}

/// Outcome of `QuizController::next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Moved { index: usize },
    Finished(CompletedQuiz),
}

/// Outcome of `QuizController::tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickStep {
    Running { remaining_secs: u32 },
    Expired(CompletedQuiz),
    /// The tick belonged to an attempt that is no longer active.
    Ignored,
}

/// Owns the single active-attempt slot and persists finished attempts.
pub struct QuizController {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<ProgressService>,
    flow: QuizFlow,
    persisted: Option<ResultId>,
}

impl QuizController {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            catalog,
            progress,
            flow: QuizFlow::new(),
            persisted: None,
        }
    }

    /// Start an attempt at the quiz with the given id, replacing any current one.
    ///
    /// Blank or unknown ids are logged and leave the current state untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the catalog cannot be read.
    pub async fn start_quiz(&mut self, id: &str) -> Result<Option<AttemptId>, QuizServiceError> {
        let Ok(quiz_id) = QuizId::new(id) else {
            warn!(quiz_id = id, "cannot start quiz with blank id");
            return Ok(None);
        };
        let Some(quiz) = self.catalog.get_quiz(&quiz_id).await? else {
            warn!(quiz_id = %quiz_id, "cannot start unknown quiz");
            return Ok(None);
        };

        self.persisted = None;
        Ok(Some(self.flow.start(quiz, self.clock.now())))
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Flow` outside an active attempt or for an
    /// out-of-range option.
    pub fn select_answer(&mut self, option: usize) -> Result<(), QuizServiceError> {
        Ok(self.flow.select_answer(option)?)
    }

    /// Advance, or finish and persist on the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` outside an active attempt or if persisting fails.
    pub async fn next(&mut self) -> Result<NextStep, QuizServiceError> {
        match self.flow.next(self.clock.now())? {
            Advance::Moved { index } => Ok(NextStep::Moved { index }),
            Advance::Finished(result) => Ok(NextStep::Finished(self.persist(result).await?)),
        }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Flow` outside an active attempt.
    pub fn previous(&mut self) -> Result<(), QuizServiceError> {
        Ok(self.flow.previous()?)
    }

    /// Grade the attempt now and persist the result. A second call fails
    /// without appending anything.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Flow` if no attempt is active, or a storage
    /// error if persisting fails.
    pub async fn finish(&mut self) -> Result<CompletedQuiz, QuizServiceError> {
        let result = self.flow.finish(self.clock.now())?;
        self.persist(result).await
    }

    /// Apply a countdown tick. Ticks for another attempt are ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` if persisting an expired attempt fails.
    pub async fn tick(&mut self, attempt: AttemptId) -> Result<TickStep, QuizServiceError> {
        match self.flow.tick(attempt, self.clock.now()) {
            Ok(FlowTick::Running { remaining_secs }) => Ok(TickStep::Running { remaining_secs }),
            Ok(FlowTick::Expired(result)) => Ok(TickStep::Expired(self.persist(result).await?)),
            Err(QuizFlowError::StaleAttempt) => {
                debug!(?attempt, "ignoring stale countdown tick");
                Ok(TickStep::Ignored)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Retry persistence of a finished attempt whose result could not be stored.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::NotActive` unless an attempt is finished, or a
    /// storage error if persisting fails again.
    pub async fn finalize_result(&mut self) -> Result<CompletedQuiz, QuizServiceError> {
        let result = self
            .flow
            .finished()
            .map(|finished| finished.result.clone())
            .ok_or(QuizFlowError::NotActive)?;
        self.persist(result).await
    }

    /// Drop any attempt and return to idle.
    pub fn reset(&mut self) {
        self.flow.reset();
        self.persisted = None;
    }

    #[must_use]
    pub fn state(&self) -> &QuizFlow {
        &self.flow
    }

    /// Storage id of the finished attempt, once persisted.
    #[must_use]
    pub fn persisted_result(&self) -> Option<ResultId> {
        self.persisted
    }

    #[must_use]
    pub fn view(&self) -> Option<QuizView> {
        self.flow.session().map(QuizView::from_session)
    }

    #[must_use]
    pub fn result_view(&self) -> Option<ResultView> {
        self.flow.finished().map(ResultView::from_finished)
    }

    async fn persist(&mut self, result: QuizResult) -> Result<CompletedQuiz, QuizServiceError> {
        let result_id = match self.persisted {
            Some(id) => id,
            None => {
                let id = self.progress.append_result(&result).await?;
                self.persisted = Some(id);
                id
            }
        };
        let newly_completed = self
            .progress
            .mark_task_completed(result.quiz_id().as_str())
            .await?;

        Ok(CompletedQuiz {
            result_id,
            result,
            newly_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use storage::catalog::InMemoryCatalog;
    use storage::repository::{
        InMemoryRepository, QuizResultRepository, Storage, StorageError, TaskRepository,
    };
    use tutor_core::model::TaskId;
    use tutor_core::time::fixed_clock;

    use crate::error::ProgressError;

    /// In-memory store whose writes fail a set number of times first.
    struct Flaky {
        inner: InMemoryRepository,
        failures: AtomicU32,
    }

    impl Flaky {
        fn failing(times: u32) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryRepository::new(),
                failures: AtomicU32::new(times),
            })
        }

        fn check(&self) -> Result<(), StorageError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left == 0 {
                return Ok(());
            }
            self.failures.store(left - 1, Ordering::SeqCst);
            Err(StorageError::Connection("database is locked".into()))
        }
    }

    #[async_trait]
    impl QuizResultRepository for Flaky {
        async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
            self.check()?;
            self.inner.append_result(result).await
        }

        async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError> {
            self.inner.list_results().await
        }
    }

    #[async_trait]
    impl TaskRepository for Flaky {
        async fn mark_completed(&self, id: &TaskId, at: DateTime<Utc>) -> Result<bool, StorageError> {
            self.check()?;
            self.inner.mark_completed(id, at).await
        }

        async fn is_completed(&self, id: &TaskId) -> Result<bool, StorageError> {
            self.inner.is_completed(id).await
        }

        async fn list_completed(&self) -> Result<Vec<TaskId>, StorageError> {
            self.inner.list_completed().await
        }
    }

    fn controller_over(
        results: Arc<dyn QuizResultRepository>,
        tasks: Arc<dyn TaskRepository>,
    ) -> (QuizController, Arc<ProgressService>) {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalog::sample().unwrap());
        let progress = Arc::new(ProgressService::new(
            fixed_clock(),
            results,
            tasks,
            Arc::new(InMemoryRepository::new()),
        ));
        (
            QuizController::new(fixed_clock(), catalog, Arc::clone(&progress)),
            progress,
        )
    }

    fn controller() -> (QuizController, Arc<ProgressService>) {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalog::sample().unwrap());
        let progress = Arc::new(ProgressService::from_storage(
            fixed_clock(),
            &Storage::in_memory(),
        ));
        (
            QuizController::new(fixed_clock(), catalog, Arc::clone(&progress)),
            progress,
        )
    }

    #[tokio::test]
    async fn unknown_or_blank_quiz_is_a_no_op() {
        let (mut quizzes, _) = controller();
        assert_eq!(quizzes.start_quiz("no-such-quiz").await.unwrap(), None);
        assert_eq!(quizzes.start_quiz("  ").await.unwrap(), None);
        assert!(quizzes.state().is_idle());
    }

    #[tokio::test]
    async fn finishing_persists_once_and_marks_completed() {
        let (mut quizzes, progress) = controller();
        quizzes.start_quiz("newton-laws").await.unwrap().unwrap();

        let completed = quizzes.finish().await.unwrap();
        assert!(completed.newly_completed);
        assert_eq!(quizzes.persisted_result(), Some(completed.result_id));

        let err = quizzes.finish().await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Flow(QuizFlowError::AlreadyFinished)
        ));
        assert_eq!(progress.results().await.unwrap().len(), 1);
        assert_eq!(progress.completed_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finalize_does_not_duplicate_results() {
        let (mut quizzes, progress) = controller();
        quizzes.start_quiz("newton-laws").await.unwrap();
        let first = quizzes.finish().await.unwrap();

        let again = quizzes.finalize_result().await.unwrap();
        assert_eq!(again.result_id, first.result_id);
        assert!(!again.newly_completed);
        assert_eq!(progress.results().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_tick_is_ignored() {
        let (mut quizzes, _) = controller();
        let old = quizzes.start_quiz("newton-laws").await.unwrap().unwrap();
        quizzes.start_quiz("newton-laws").await.unwrap();

        assert_eq!(quizzes.tick(old).await.unwrap(), TickStep::Ignored);
        assert_eq!(quizzes.view().unwrap().remaining_secs, 15 * 60);
    }

    #[tokio::test]
    async fn view_tracks_selection_and_countdown() {
        let (mut quizzes, _) = controller();
        let attempt = quizzes.start_quiz("algebra-basics").await.unwrap().unwrap();
        quizzes.select_answer(1).unwrap();
        quizzes.tick(attempt).await.unwrap();

        let view = quizzes.view().unwrap();
        assert_eq!(view.selected, Some(1));
        assert_eq!(view.remaining, "9:59");
        assert_eq!(view.progress.position, 1);
        assert_eq!(view.progress.total, 3);
    }

    #[tokio::test]
    async fn failed_append_is_retried_once() {
        let (mut quizzes, progress) =
            controller_over(Flaky::failing(1), Arc::new(InMemoryRepository::new()));
        quizzes.start_quiz("newton-laws").await.unwrap();

        let err = quizzes.finish().await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Progress(ProgressError::Storage(StorageError::Connection(_)))
        ));
        assert!(quizzes.state().finished().is_some());
        assert_eq!(quizzes.persisted_result(), None);
        assert!(progress.results().await.unwrap().is_empty());

        let retried = quizzes.finalize_result().await.unwrap();
        assert!(retried.newly_completed);
        assert_eq!(quizzes.persisted_result(), Some(retried.result_id));
        assert_eq!(progress.results().await.unwrap().len(), 1);

        let again = quizzes.finalize_result().await.unwrap();
        assert_eq!(again.result_id, retried.result_id);
        assert!(!again.newly_completed);
        assert_eq!(progress.results().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_completion_mark_does_not_append_twice() {
        let (mut quizzes, progress) =
            controller_over(Arc::new(InMemoryRepository::new()), Flaky::failing(1));
        quizzes.start_quiz("newton-laws").await.unwrap();

        assert!(quizzes.finish().await.is_err());
        let stored = quizzes.persisted_result().expect("result was appended");
        assert_eq!(progress.results().await.unwrap().len(), 1);
        assert!(progress.completed_tasks().await.unwrap().is_empty());

        let retried = quizzes.finalize_result().await.unwrap();
        assert_eq!(retried.result_id, stored);
        assert!(retried.newly_completed);
        assert_eq!(progress.results().await.unwrap().len(), 1);
        assert_eq!(progress.completed_tasks().await.unwrap().len(), 1);
    }
}
