use tutor_core::model::{QuestionId, QuizId, ScoreBand};
use tutor_core::time::format_countdown;
use tutor_core::{FinishedAttempt, QuizSession, SessionProgress};

/// Display-ready snapshot of the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub question_id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub progress: SessionProgress,
    pub remaining_secs: u32,
    /// `m:ss` countdown label.
    pub remaining: String,
}

impl QuizView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let quiz = session.quiz();
        let question = session.current_question();
        Self {
            quiz_id: quiz.id().clone(),
            quiz_title: quiz.title().to_owned(),
            question_id: question.id().clone(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            selected: session.selection(session.current_index()),
            progress: session.progress(),
            remaining_secs: session.remaining_secs(),
            remaining: format_countdown(session.remaining_secs()),
        }
    }
}

/// One row of the results review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub prompt: String,
    pub selected: Option<String>,
    pub correct: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// Results screen for a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub quiz_title: String,
    pub score: u8,
    pub band: ScoreBand,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub expired: bool,
    pub items: Vec<ReviewItem>,
}

impl ResultView {
    #[must_use]
    pub fn from_finished(finished: &FinishedAttempt) -> Self {
        let items = finished
            .quiz
            .questions()
            .iter()
            .zip(&finished.reviews)
            .map(|(question, review)| ReviewItem {
                prompt: question.prompt().to_owned(),
                selected: review.selected.and_then(|i| question.option(i)).map(str::to_owned),
                correct: question
                    .option(review.correct)
                    .unwrap_or_default()
                    .to_owned(),
                is_correct: review.is_correct,
                explanation: question.explanation().to_owned(),
            })
            .collect();

        Self {
            quiz_title: finished.result.quiz_title().to_owned(),
            score: finished.result.score(),
            band: finished.result.band(),
            correct_answers: finished.result.correct_answers(),
            total_questions: finished.result.total_questions(),
            expired: finished.expired,
            items,
        }
    }
}
