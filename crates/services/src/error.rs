//! Shared error types for the services crate.

use thiserror::Error;

use storage::catalog::CatalogLoadError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::QuizFlowError;
use tutor_core::model::ChatMessageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Message(#[from] ChatMessageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Flow(#[from] QuizFlowError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the tutor chat and its completion client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("tutor chat is not configured")]
    Disabled,
    #[error("completion endpoint returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
