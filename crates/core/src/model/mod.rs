mod chat;
mod ids;
mod material;
mod quiz;
mod result;

pub use chat::{Author, ChatMessage, ChatMessageError, TaskKind, TaskSuggestion};
pub use ids::{AttemptId, IdError, MaterialId, MessageId, QuestionId, QuizId, ResultId, TaskId};
pub use material::{Material, MaterialError, MaterialKind};
pub use quiz::{Difficulty, ParseDifficultyError, Question, QuestionError, Quiz, QuizError};
pub use result::{QuizResult, QuizResultError, ScoreBand, score_percent};
