use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Storage row identifier of a persisted quiz result.
///
/// NOTE: This is `i64` to match `SQLite` row IDs.
pub type ResultId = i64;

/// Error returned when an identifier fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} cannot be empty")]
pub struct IdError {
    kind: &'static str,
}

impl IdError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from a trimmed, non-empty string.")]
            ///
            /// # Errors
            ///
            /// Returns `IdError` if the value is empty after trimming.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(IdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Quiz
    QuizId
);
string_id!(
    /// Identifier of a Question, unique within its quiz
    QuestionId
);
string_id!(
    /// Unique identifier for a library Material
    MaterialId
);
string_id!(
    /// Identifier of a completable task (a quiz or a material)
    TaskId
);

impl From<&QuizId> for TaskId {
    fn from(id: &QuizId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&MaterialId> for TaskId {
    fn from(id: &MaterialId) -> Self {
        Self(id.0.clone())
    }
}

/// Unique identifier for a chat message
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

/// Identity of one quiz attempt; a new one is minted on every start.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_id_is_trimmed() {
        let id = QuizId::new("  algebra-1 ").unwrap();
        assert_eq!(id.as_str(), "algebra-1");
        assert_eq!(id.to_string(), "algebra-1");
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = QuizId::new("   ").unwrap_err();
        assert_eq!(err.kind(), "QuizId");
        assert!("".parse::<TaskId>().is_err());
    }

    #[test]
    fn task_id_from_quiz_and_material() {
        let quiz = QuizId::new("q1").unwrap();
        let material = MaterialId::new("m1").unwrap();
        assert_eq!(TaskId::from(&quiz).as_str(), "q1");
        assert_eq!(TaskId::from(&material).as_str(), "m1");
    }

    #[test]
    fn debug_format_names_the_kind() {
        let id = MaterialId::new("m7").unwrap();
        assert_eq!(format!("{id:?}"), "MaterialId(\"m7\")");
    }

    #[test]
    fn attempts_are_distinct() {
        assert_ne!(AttemptId::random(), AttemptId::random());
    }
}
