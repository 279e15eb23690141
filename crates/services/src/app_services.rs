use std::sync::Arc;

use storage::catalog::{CatalogRepository, InMemoryCatalog};
use storage::repository::Storage;
use tokio::sync::Mutex;
use tracing::info;

use crate::Clock;
use crate::chat::{CompletionClient, HttpCompletionClient, TutorChatService};
use crate::config::TutorConfig;
use crate::error::AppServicesError;
use crate::library_service::LibraryService;
use crate::profile_service::ProfileService;
use crate::progress_service::ProgressService;
use crate::quizzes::QuizController;

/// Assembles app-facing services over one storage backend and catalog.
///
/// Clones share the same services, including the single quiz slot.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<dyn CatalogRepository>,
    quizzes: Arc<Mutex<QuizController>>,
    progress: Arc<ProgressService>,
    profile: Arc<ProfileService>,
    library: Arc<LibraryService>,
    chat: Arc<TutorChatService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be loaded or storage
    /// initialization fails.
    pub async fn from_config(config: &TutorConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let catalog = match &config.catalog_path {
            Some(path) => InMemoryCatalog::from_path(path)?,
            None => InMemoryCatalog::sample()?,
        };
        let storage = Storage::sqlite(&config.db_url).await?;
        let client = config.chat_url.as_ref().map(|url| {
            Arc::new(HttpCompletionClient::new(url.clone())) as Arc<dyn CompletionClient>
        });
        info!(db_url = %config.db_url, chat = client.is_some(), "services ready");

        Ok(Self::from_parts(
            clock,
            &storage,
            Arc::new(catalog),
            client,
            config.message_cap,
        ))
    }

    /// In-memory storage with the bundled sample catalog and chat disabled.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the sample catalog fails to parse.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Ok(Self::from_parts(
            clock,
            &Storage::in_memory(),
            Arc::new(InMemoryCatalog::sample()?),
            None,
            crate::config::DEFAULT_MESSAGE_CAP,
        ))
    }

    #[must_use]
    pub fn from_parts(
        clock: Clock,
        storage: &Storage,
        catalog: Arc<dyn CatalogRepository>,
        client: Option<Arc<dyn CompletionClient>>,
        message_cap: u32,
    ) -> Self {
        let progress =
            Arc::new(ProgressService::from_storage(clock, storage).with_message_cap(message_cap));
        let profile = Arc::new(ProfileService::new(Arc::clone(&progress)));
        let library = Arc::new(LibraryService::new(Arc::clone(&catalog)));
        let chat = Arc::new(TutorChatService::new(
            clock,
            Arc::clone(&progress),
            Arc::clone(&catalog),
            client,
        ));

        let quizzes = Arc::new(Mutex::new(QuizController::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&progress),
        )));

        Self {
            catalog,
            quizzes,
            progress,
            profile,
            library,
            chat,
        }
    }

    /// The one quiz controller. Starting a quiz through any handle replaces
    /// the attempt seen by every other handle.
    #[must_use]
    pub fn quiz_controller(&self) -> Arc<Mutex<QuizController>> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn CatalogRepository> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn profile(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile)
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn chat(&self) -> Arc<TutorChatService> {
        Arc::clone(&self.chat)
    }
}
