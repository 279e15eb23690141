//! Quiz attempt state machine.
//!
//! ```text
//! Idle --start--> Active --next on last / finish / timer expiry--> Finished
//!  ^                |  ^                                              |
//!  |                +--+ select_answer, next, previous, tick          |
//!  +------------------------------- reset ----------------------------+
//! ```
//!
//! `start` is accepted from every state and replaces whatever was there. An
//! abandoned `Active` attempt is dropped without producing a result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::model::{AttemptId, Quiz, QuizResult, QuizResultError};
use crate::session::{AnswerReview, QuizSession, TickOutcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizFlowError {
    #[error("no quiz in progress")]
    NotActive,

    #[error("quiz already finished")]
    AlreadyFinished,

    #[error("option {option} is out of range for {count} options")]
    InvalidOption { option: usize, count: usize },

    #[error("tick does not belong to the active attempt")]
    StaleAttempt,

    #[error(transparent)]
    Result(#[from] QuizResultError),
}

/// Terminal state of an attempt, kept around for the results review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedAttempt {
    pub attempt: AttemptId,
    pub quiz: Arc<Quiz>,
    pub result: QuizResult,
    pub reviews: Vec<AnswerReview>,
    /// Finished because the time budget ran out.
    pub expired: bool,
}

/// Outcome of `QuizFlow::next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { index: usize },
    Finished(QuizResult),
}

/// Outcome of `QuizFlow::tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowTick {
    Running { remaining_secs: u32 },
    Expired(QuizResult),
}

/// Single slot holding at most one quiz attempt.
#[derive(Debug, Clone, Default)]
pub enum QuizFlow {
    #[default]
    Idle,
    Active(QuizSession),
    Finished(FinishedAttempt),
}

impl QuizFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::Idle
    }

    /// Begin a fresh attempt, discarding any previous state.
    pub fn start(&mut self, quiz: Arc<Quiz>, now: DateTime<Utc>) -> AttemptId {
        let session = QuizSession::start(quiz, now);
        let attempt = session.attempt();
        debug!(quiz_id = %session.quiz().id(), ?attempt, "quiz attempt started");
        *self = QuizFlow::Active(session);
        attempt
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, QuizFlow::Idle)
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match self {
            QuizFlow::Active(session) => Some(session),
            QuizFlow::Idle | QuizFlow::Finished(_) => None,
        }
    }

    #[must_use]
    pub fn finished(&self) -> Option<&FinishedAttempt> {
        match self {
            QuizFlow::Finished(finished) => Some(finished),
            QuizFlow::Idle | QuizFlow::Active(_) => None,
        }
    }

    /// # Errors
    ///
    /// Returns `QuizFlowError::NotActive`/`AlreadyFinished` outside an attempt, or
    /// `QuizFlowError::InvalidOption` for an out-of-range option.
    pub fn select_answer(&mut self, option: usize) -> Result<(), QuizFlowError> {
        self.active_mut()?.select_answer(option)
    }

    /// Advance to the next question, finishing the attempt on the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::NotActive`/`AlreadyFinished` outside an attempt.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<Advance, QuizFlowError> {
        let session = self.active_mut()?;
        if session.advance() {
            return Ok(Advance::Moved {
                index: session.current_index(),
            });
        }
        self.complete(now, false).map(Advance::Finished)
    }

    /// # Errors
    ///
    /// Returns `QuizFlowError::NotActive`/`AlreadyFinished` outside an attempt.
    pub fn previous(&mut self) -> Result<(), QuizFlowError> {
        self.active_mut()?.previous();
        Ok(())
    }

    /// Grade the attempt and move to `Finished`. One-shot: a second call fails.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::AlreadyFinished` if the attempt was already graded,
    /// or `QuizFlowError::NotActive` when idle.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<QuizResult, QuizFlowError> {
        self.complete(now, false)
    }

    /// Apply one countdown tick; expiry finishes the attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::StaleAttempt` if `attempt` is not the active attempt.
    pub fn tick(&mut self, attempt: AttemptId, now: DateTime<Utc>) -> Result<FlowTick, QuizFlowError> {
        let QuizFlow::Active(session) = self else {
            return Err(QuizFlowError::StaleAttempt);
        };
        if session.attempt() != attempt {
            return Err(QuizFlowError::StaleAttempt);
        }
        match session.tick() {
            TickOutcome::Running { remaining_secs } => Ok(FlowTick::Running { remaining_secs }),
            TickOutcome::Expired => self.complete(now, true).map(FlowTick::Expired),
        }
    }

    /// Return to idle from any state.
    pub fn reset(&mut self) {
        *self = QuizFlow::Idle;
    }

    fn active_mut(&mut self) -> Result<&mut QuizSession, QuizFlowError> {
        match self {
            QuizFlow::Active(session) => Ok(session),
            QuizFlow::Idle => Err(QuizFlowError::NotActive),
            QuizFlow::Finished(_) => Err(QuizFlowError::AlreadyFinished),
        }
    }

    fn complete(&mut self, now: DateTime<Utc>, expired: bool) -> Result<QuizResult, QuizFlowError> {
        let session = self.active_mut()?;
        let result = session.build_result(now)?;
        let finished = FinishedAttempt {
            attempt: session.attempt(),
            quiz: Arc::clone(session.quiz()),
            result: result.clone(),
            reviews: session.reviews(),
            expired,
        };
        debug!(
            quiz_id = %result.quiz_id(),
            score = result.score(),
            expired,
            "quiz attempt finished"
        );
        *self = QuizFlow::Finished(finished);
        Ok(result)
    }
}
