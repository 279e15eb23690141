use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::MaterialId;
use crate::model::quiz::Difficulty;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material title cannot be empty")]
    EmptyTitle,

    #[error("rating must be within 0..=5, got {0}")]
    InvalidRating(f32),

    #[error("unknown material kind: {0}")]
    UnknownKind(String),
}

/// How a library material is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Article,
    Video,
    Interactive,
}

impl MaterialKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::Article => "article",
            MaterialKind::Video => "video",
            MaterialKind::Interactive => "interactive",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "video" => Ok(Self::Video),
            "interactive" => Ok(Self::Interactive),
            _ => Err(MaterialError::UnknownKind(s.to_owned())),
        }
    }
}

/// Read-only study material from the library catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    id: MaterialId,
    title: String,
    description: String,
    category: String,
    difficulty: Difficulty,
    kind: MaterialKind,
    duration: Option<String>,
    rating: f32,
    content: String,
    video_url: Option<String>,
    image_url: Option<String>,
}

impl Material {
    /// Creates a validated material.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the title is blank or the rating is outside `0..=5`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MaterialId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        difficulty: Difficulty,
        kind: MaterialKind,
        duration: Option<String>,
        rating: f32,
        content: impl Into<String>,
    ) -> Result<Self, MaterialError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(MaterialError::EmptyTitle);
        }
        if !(0.0..=5.0).contains(&rating) {
            return Err(MaterialError::InvalidRating(rating));
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            category: category.into(),
            difficulty,
            kind,
            duration,
            rating,
            content: content.into(),
            video_url: None,
            image_url: None,
        })
    }

    #[must_use]
    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &MaterialId {
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
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    #[must_use]
    pub fn rating(&self) -> f32 {
        self.rating
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Case-insensitive substring match on title or description.
    /// A blank query matches every material.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}
