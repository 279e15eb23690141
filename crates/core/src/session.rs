use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::flow::QuizFlowError;
use crate::model::{AttemptId, Question, QuestionId, Quiz, QuizResult, QuizResultError, score_percent};

//
// ─── PROGRESS & REVIEW ─────────────────────────────────────────────────────────
//

/// Snapshot of where the learner is within the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub percent: u8,
    pub answered: usize,
    pub is_last: bool,
    /// The current question has a selection. Presentation gates "next" on this;
    /// the session itself does not.
    pub can_advance: bool,
}

/// Per-question outcome shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReview {
    pub question_id: QuestionId,
    pub selected: Option<usize>,
    pub correct: usize,
    pub is_correct: bool,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Mutable state of one in-progress quiz attempt.
///
/// Invariants:
/// - `current < quiz.questions().len()`
/// - `selections.len() == quiz.questions().len()`
/// - every `Some(i)` in `selections` is a valid option index of its question
/// - `remaining_secs` never increases
#[derive(Clone)]
pub struct QuizSession {
    attempt: AttemptId,
    quiz: Arc<Quiz>,
    current: usize,
    selections: Vec<Option<usize>>,
    remaining_secs: u32,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Fresh attempt: first question, nothing answered, full time budget.
    #[must_use]
    pub fn start(quiz: Arc<Quiz>, started_at: DateTime<Utc>) -> Self {
        Self {
            attempt: AttemptId::random(),
            current: 0,
            selections: vec![None; quiz.question_count()],
            remaining_secs: quiz.time_limit_secs(),
            started_at,
            quiz,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.quiz.questions()[self.current]
    }

    #[must_use]
    pub fn selections(&self) -> &[Option<usize>] {
        &self.selections
    }

    #[must_use]
    pub fn selection(&self, index: usize) -> Option<usize> {
        self.selections.get(index).copied().flatten()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.selections.len()
    }

    /// Record (or overwrite) the answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::InvalidOption` if `option` is not an index into
    /// the current question's options.
    pub fn select_answer(&mut self, option: usize) -> Result<(), QuizFlowError> {
        let count = self.current_question().options().len();
        if option >= count {
            return Err(QuizFlowError::InvalidOption { option, count });
        }
        self.selections[self.current] = Some(option);
        Ok(())
    }

    /// Move to the next question. Returns `false` (and stays put) on the last one.
    pub(crate) fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Move back one question; the first question is a floor.
    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Consume one second of the time budget.
    pub fn tick(&mut self) -> TickOutcome {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.quiz
            .questions()
            .iter()
            .zip(&self.selections)
            .filter(|(question, selection)| question.is_correct(**selection))
            .count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.selections.len();
        let position = self.current + 1;
        SessionProgress {
            position,
            total,
            percent: u32::try_from(position)
                .ok()
                .zip(u32::try_from(total).ok())
                .and_then(|(p, t)| score_percent(p, t).ok())
                .unwrap_or(100),
            answered: self.answered_count(),
            is_last: self.is_last(),
            can_advance: self.selections[self.current].is_some(),
        }
    }

    #[must_use]
    pub fn reviews(&self) -> Vec<AnswerReview> {
        self.quiz
            .questions()
            .iter()
            .zip(&self.selections)
            .map(|(question, selection)| AnswerReview {
                question_id: question.id().clone(),
                selected: *selection,
                correct: question.correct_answer(),
                is_correct: question.is_correct(*selection),
            })
            .collect()
    }

    /// Grade the attempt into an immutable result.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the quiz title is blank.
    pub fn build_result(&self, completed_at: DateTime<Utc>) -> Result<QuizResult, QuizResultError> {
        let total = u32::try_from(self.selections.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(self.correct_count()).unwrap_or(total);
        QuizResult::new(
            self.quiz.id().clone(),
            self.quiz.title(),
            total,
            correct,
            completed_at,
        )
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("attempt", &self.attempt)
            .field("quiz_id", self.quiz.id())
            .field("current", &self.current)
            .field("selections", &self.selections)
            .field("remaining_secs", &self.remaining_secs)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
