use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::QuizId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("a result needs at least one question")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("score must be within 0..=100, got {0}")]
    ScoreOutOfRange(u32),
}

/// Immutable record of one completed quiz attempt.
///
/// The title is a snapshot taken at completion time and does not follow later
/// catalog edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    quiz_id: QuizId,
    quiz_title: String,
    score: u8,
    total_questions: u32,
    correct_answers: u32,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Build a result from raw counts, computing the percentage score.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the title is blank, `total_questions` is zero,
    /// or `correct_answers` exceeds `total_questions`.
    pub fn new(
        quiz_id: QuizId,
        quiz_title: impl Into<String>,
        total_questions: u32,
        correct_answers: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        let score = score_percent(correct_answers, total_questions)?;
        Self::from_persisted(
            quiz_id,
            quiz_title,
            u32::from(score),
            total_questions,
            correct_answers,
            completed_at,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if any stored field violates the result invariants.
    pub fn from_persisted(
        quiz_id: QuizId,
        quiz_title: impl Into<String>,
        score: u32,
        total_questions: u32,
        correct_answers: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        let quiz_title = quiz_title.into();
        if quiz_title.trim().is_empty() {
            return Err(QuizResultError::EmptyTitle);
        }
        if total_questions == 0 {
            return Err(QuizResultError::NoQuestions);
        }
        if correct_answers > total_questions {
            return Err(QuizResultError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or(QuizResultError::ScoreOutOfRange(score))?;

        Ok(Self {
            quiz_id,
            quiz_title,
            score,
            total_questions,
            correct_answers,
            completed_at,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    /// Percentage score, `0..=100`.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.score)
    }
}

/// `round(correct / total * 100)` with halves rounded up.
///
/// # Errors
///
/// Returns `QuizResultError` if `total` is zero or `correct > total`.
pub fn score_percent(correct: u32, total: u32) -> Result<u8, QuizResultError> {
    if total == 0 {
        return Err(QuizResultError::NoQuestions);
    }
    if correct > total {
        return Err(QuizResultError::CorrectExceedsTotal { correct, total });
    }
    let scaled = u64::from(correct) * 200 + u64::from(total);
    let score = scaled / (u64::from(total) * 2);
    // correct <= total keeps this within 0..=100
    Ok(u8::try_from(score).unwrap_or(100))
}

/// Coarse grading used to color scores in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 80 and above.
    High,
    /// 60 to 79.
    Medium,
    Low,
}

impl ScoreBand {
    #[must_use]
    pub fn for_score(score: u8) -> Self {
        match score {
            80.. => ScoreBand::High,
            60..=79 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}
