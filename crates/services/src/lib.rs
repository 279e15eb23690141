#![forbid(unsafe_code)]

pub mod app_services;
pub mod chat;
pub mod config;
pub mod error;
pub mod library_service;
pub mod profile_service;
pub mod progress_service;
pub mod quizzes;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use chat::{CompletionClient, HttpCompletionClient, TutorChatService};
pub use config::TutorConfig;
pub use error::{AppServicesError, ChatError, ConfigError, ProgressError, QuizServiceError};
pub use library_service::LibraryService;
pub use profile_service::{ProfileService, ProfileSummary};
pub use progress_service::ProgressService;
pub use quizzes::{CompletedQuiz, Countdown, NextStep, QuizController, QuizView, Tick, TickStep};
