use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{MessageId, TaskId};
use crate::model::material::Material;
use crate::model::quiz::{Difficulty, Quiz};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChatMessageError {
    #[error("message text cannot be empty")]
    EmptyText,

    #[error("unknown message author: {0}")]
    UnknownAuthor(String),

    #[error("unknown task kind: {0}")]
    UnknownTaskKind(String),
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User,
    Tutor,
}

impl Author {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Tutor => "tutor",
        }
    }

    /// # Errors
    ///
    /// Returns `ChatMessageError::UnknownAuthor` for any other value.
    pub fn parse(value: &str) -> Result<Self, ChatMessageError> {
        match value {
            "user" => Ok(Author::User),
            "tutor" => Ok(Author::Tutor),
            other => Err(ChatMessageError::UnknownAuthor(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Quiz,
    Material,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Quiz => "quiz",
            TaskKind::Material => "material",
        }
    }

    /// # Errors
    ///
    /// Returns `ChatMessageError::UnknownTaskKind` for any other value.
    pub fn parse(value: &str) -> Result<Self, ChatMessageError> {
        match value {
            "quiz" => Ok(TaskKind::Quiz),
            "material" => Ok(TaskKind::Material),
            other => Err(ChatMessageError::UnknownTaskKind(other.to_owned())),
        }
    }
}

/// A quiz or material the tutor recommends from inside the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSuggestion {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
}

impl TaskSuggestion {
    #[must_use]
    pub fn for_quiz(quiz: &Quiz) -> Self {
        Self {
            task_id: TaskId::from(quiz.id()),
            kind: TaskKind::Quiz,
            title: quiz.title().to_owned(),
            description: quiz.description().to_owned(),
            category: quiz.category().to_owned(),
            difficulty: quiz.difficulty(),
            estimated_time: format!("{} min", quiz.time_limit_minutes()),
        }
    }

    #[must_use]
    pub fn for_material(material: &Material) -> Self {
        Self {
            task_id: TaskId::from(material.id()),
            kind: TaskKind::Material,
            title: material.title().to_owned(),
            description: material.description().to_owned(),
            category: material.category().to_owned(),
            difficulty: material.difficulty(),
            estimated_time: material.duration().unwrap_or("15 min").to_owned(),
        }
    }
}

/// One entry of the tutor conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    id: MessageId,
    author: Author,
    text: String,
    sent_at: DateTime<Utc>,
    task: Option<TaskSuggestion>,
}

impl ChatMessage {
    /// # Errors
    ///
    /// Returns `ChatMessageError::EmptyText` if the text is blank.
    pub fn new(
        id: MessageId,
        author: Author,
        text: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Result<Self, ChatMessageError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatMessageError::EmptyText);
        }
        Ok(Self {
            id,
            author,
            text: trimmed.to_owned(),
            sent_at,
            task: None,
        })
    }

    #[must_use]
    pub fn with_task(mut self, task: TaskSuggestion) -> Self {
        self.task = Some(task);
        self
    }

    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub fn author(&self) -> Author {
        self.author
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    #[must_use]
    pub fn task(&self) -> Option<&TaskSuggestion> {
        self.task.as_ref()
    }
}
