use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use tutor_core::model::{
    Difficulty, IdError, Material, MaterialError, MaterialId, MaterialKind, ParseDifficultyError,
    Question, QuestionError, QuestionId, Quiz, QuizError, QuizId,
};

use crate::repository::StorageError;

const SAMPLE_CATALOG: &str = include_str!("../data/sample_catalog.json");

/// Read-only access to quiz and material reference data.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backing catalog cannot be read.
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<Arc<Quiz>>, StorageError>;

    /// Quizzes in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing catalog cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<Arc<Quiz>>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backing catalog cannot be read.
    async fn get_material(&self, id: &MaterialId) -> Result<Option<Material>, StorageError>;

    /// Materials in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing catalog cannot be read.
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError>;
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Why a single catalog record was rejected.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CatalogRecordError {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Material(#[from] MaterialError),
}

/// Errors that abort loading a whole catalog document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Wire shape of a catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub quizzes: Vec<QuizRecord>,
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionRecord {
    /// # Errors
    ///
    /// Returns `CatalogRecordError` if the record violates question invariants.
    pub fn into_question(self) -> Result<Question, CatalogRecordError> {
        Ok(Question::new(
            QuestionId::new(self.id)?,
            self.question,
            self.options,
            self.correct_answer,
            self.explanation,
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub time_limit: u32,
    pub questions: Vec<QuestionRecord>,
}

impl QuizRecord {
    /// # Errors
    ///
    /// Returns `CatalogRecordError` if the quiz or any of its questions is invalid.
    pub fn into_quiz(self) -> Result<Quiz, CatalogRecordError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Quiz::new(
            QuizId::new(self.id)?,
            self.title,
            self.description,
            self.category,
            self.difficulty.parse::<Difficulty>()?,
            self.time_limit,
            questions,
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub content: String,
    pub video_url: Option<String>,
    pub image: Option<String>,
}

impl MaterialRecord {
    /// # Errors
    ///
    /// Returns `CatalogRecordError` if the record violates material invariants.
    pub fn into_material(self) -> Result<Material, CatalogRecordError> {
        let mut material = Material::new(
            MaterialId::new(self.id)?,
            self.title,
            self.description,
            self.category,
            self.difficulty.parse::<Difficulty>()?,
            self.kind.parse::<MaterialKind>()?,
            self.duration,
            self.rating,
            self.content,
        )?;
        if let Some(url) = self.video_url {
            material = material.with_video_url(url);
        }
        if let Some(url) = self.image {
            material = material.with_image_url(url);
        }
        Ok(material)
    }
}

//
// ─── IN-MEMORY CATALOG ─────────────────────────────────────────────────────────
//

/// Immutable catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    quizzes: Vec<Arc<Quiz>>,
    materials: Vec<Material>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(quizzes: Vec<Quiz>, materials: Vec<Material>) -> Self {
        Self {
            quizzes: quizzes.into_iter().map(Arc::new).collect(),
            materials,
        }
    }

    /// Build from a parsed document. Invalid or duplicate records are logged and skipped.
    #[must_use]
    pub fn from_document(doc: CatalogDocument) -> Self {
        let mut quiz_ids = HashSet::new();
        let mut quizzes = Vec::with_capacity(doc.quizzes.len());
        for record in doc.quizzes {
            let raw_id = record.id.clone();
            match record.into_quiz() {
                Ok(quiz) if quiz_ids.insert(quiz.id().clone()) => quizzes.push(Arc::new(quiz)),
                Ok(_) => warn!(quiz_id = %raw_id, "duplicate quiz id in catalog; skipping"),
                Err(err) => warn!(quiz_id = %raw_id, error = %err, "invalid quiz in catalog; skipping"),
            }
        }

        let mut material_ids = HashSet::new();
        let mut materials = Vec::with_capacity(doc.materials.len());
        for record in doc.materials {
            let raw_id = record.id.clone();
            match record.into_material() {
                Ok(material) if material_ids.insert(material.id().clone()) => materials.push(material),
                Ok(_) => warn!(material_id = %raw_id, "duplicate material id in catalog; skipping"),
                Err(err) => {
                    warn!(material_id = %raw_id, error = %err, "invalid material in catalog; skipping");
                }
            }
        }

        Self { quizzes, materials }
    }

    /// # Errors
    ///
    /// Returns `CatalogLoadError::Json` if the document itself is malformed.
    pub fn from_json(json: &str) -> Result<Self, CatalogLoadError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc))
    }

    /// # Errors
    ///
    /// Returns `CatalogLoadError` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogLoadError` if the bundled document fails to parse.
    pub fn sample() -> Result<Self, CatalogLoadError> {
        Self::from_json(SAMPLE_CATALOG)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<Arc<Quiz>>, StorageError> {
        Ok(self.quizzes.iter().find(|q| q.id() == id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Arc<Quiz>>, StorageError> {
        Ok(self.quizzes.clone())
    }

    async fn get_material(&self, id: &MaterialId) -> Result<Option<Material>, StorageError> {
        Ok(self.materials.iter().find(|m| m.id() == id).cloned())
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        Ok(self.materials.clone())
    }
}
