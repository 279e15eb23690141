mod controller;
mod countdown;
mod view;

// Public API of the quiz subsystem.
pub use crate::error::QuizServiceError;
pub use controller::{CompletedQuiz, NextStep, QuizController, TickStep};
pub use countdown::{Countdown, Tick};
pub use view::{QuizView, ResultView, ReviewItem};
