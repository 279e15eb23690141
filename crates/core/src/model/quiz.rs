use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer {index} is out of range for {count} options")]
    CorrectAnswerOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(String);

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tag shared by quizzes and materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Beginner" => Ok(Self::Beginner),
            "Intermediate" => Ok(Self::Intermediate),
            "Advanced" => Ok(Self::Advanced),
            other => Err(ParseDifficultyError(other.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// Invariants: at least two options, and `correct_answer` indexes into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are fewer than two
    /// options, or `correct_answer` is not a valid option index.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer,
                count: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_answer,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Exact-match grading: an unanswered slot never matches.
    #[must_use]
    pub fn is_correct(&self, selection: Option<usize>) -> bool {
        selection == Some(self.correct_answer)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Immutable quiz definition supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    category: String,
    difficulty: Difficulty,
    time_limit_minutes: u32,
    questions: Vec<Question>,
}

impl Quiz {
    /// Creates a validated quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is blank, there are no questions, the
    /// time limit is zero, or two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        difficulty: Difficulty,
        time_limit_minutes: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if time_limit_minutes == 0 {
            return Err(QuizError::InvalidTimeLimit);
        }
        for (i, question) in questions.iter().enumerate() {
            if questions[..i].iter().any(|q| q.id() == question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id().clone()));
            }
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            category: category.into(),
            difficulty,
            time_limit_minutes,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    /// Full time budget in seconds.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    /// Never empty.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    fn question(id: &str) -> Question {
        Question::new(QuestionId::new(id).unwrap(), "2 + 2?", options(3), 1, "").unwrap()
    }

    #[test]
    fn question_requires_two_options() {
        let err = Question::new(QuestionId::new("q").unwrap(), "?", options(1), 0, "").unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = Question::new(QuestionId::new("q").unwrap(), "?", options(2), 2, "").unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectAnswerOutOfRange { index: 2, count: 2 }
        );
    }

    #[test]
    fn unanswered_never_matches() {
        let q = question("q1");
        assert!(!q.is_correct(None));
        assert!(!q.is_correct(Some(0)));
        assert!(q.is_correct(Some(1)));
    }

    #[test]
    fn quiz_requires_questions() {
        let err = Quiz::new(
            QuizId::new("quiz").unwrap(),
            "Algebra",
            "",
            "Mathematics",
            Difficulty::Beginner,
            10,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::NoQuestions);
    }

    #[test]
    fn quiz_rejects_duplicate_question_ids() {
        let err = Quiz::new(
            QuizId::new("quiz").unwrap(),
            "Algebra",
            "",
            "Mathematics",
            Difficulty::Beginner,
            10,
            vec![question("q1"), question("q1")],
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::DuplicateQuestion(_)));
    }

    #[test]
    fn time_limit_is_converted_to_seconds() {
        let quiz = Quiz::new(
            QuizId::new("quiz").unwrap(),
            "Algebra",
            "",
            "Mathematics",
            Difficulty::Advanced,
            15,
            vec![question("q1")],
        )
        .unwrap();
        assert_eq!(quiz.time_limit_secs(), 900);
    }

    #[test]
    fn difficulty_parses_and_prints() {
        assert_eq!("Intermediate".parse::<Difficulty>().unwrap(), Difficulty::Intermediate);
        assert_eq!(Difficulty::Advanced.to_string(), "Advanced");
        assert!("Expert".parse::<Difficulty>().is_err());
    }
}
