#![forbid(unsafe_code)]

pub mod flow;
pub mod model;
pub mod session;
pub mod stats;
pub mod time;

pub use flow::{Advance, FinishedAttempt, FlowTick, QuizFlow, QuizFlowError};
pub use session::{AnswerReview, QuizSession, SessionProgress, TickOutcome};
pub use time::Clock;
