use std::sync::Arc;

use storage::catalog::CatalogRepository;
use tracing::{debug, warn};
use tutor_core::model::{Author, ChatMessage, MessageId, TaskKind, TaskSuggestion};

use super::client::{CompletionClient, CompletionMessage, CompletionRole};
use super::suggestions::suggest_tasks;
use crate::Clock;
use crate::error::{ChatError, ProgressError};
use crate::progress_service::ProgressService;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI tutor. Give clear, educational explanations \
of academic questions. Keep answers short but informative. Focus on helping students understand \
concepts rather than just giving answers. When appropriate, suggest related quizzes or study \
materials. If the user asks about a specific topic, you may propose matching tasks.";

/// Conversation with the tutor, persisted through `ProgressService`.
#[derive(Clone)]
pub struct TutorChatService {
    clock: Clock,
    progress: Arc<ProgressService>,
    catalog: Arc<dyn CatalogRepository>,
    client: Option<Arc<dyn CompletionClient>>,
}

impl TutorChatService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<ProgressService>,
        catalog: Arc<dyn CatalogRepository>,
        client: Option<Arc<dyn CompletionClient>>,
    ) -> Self {
        Self {
            clock,
            progress,
            catalog,
            client,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Send a learner message and record the tutor's reply and suggestions.
    ///
    /// Blank input is ignored. If the completion fails the failure is logged and
    /// only the learner's message is kept. Returns the messages appended.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the conversation cannot be stored.
    pub async fn send_message(&self, text: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank chat message");
            return Ok(Vec::new());
        }

        let user = self.append(Author::User, text, None).await?;
        let mut appended = vec![user];

        let reply = match self.complete(text).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "tutor completion failed");
                return Ok(appended);
            }
        };
        appended.push(self.append(Author::Tutor, &reply, None).await?);

        let quizzes = self.catalog.list_quizzes().await?;
        let materials = self.catalog.list_materials().await?;
        for suggestion in suggest_tasks(text, &quizzes, &materials) {
            debug!(task_id = %suggestion.task.task_id, "suggesting task");
            appended.push(
                self.append(Author::Tutor, &suggestion.text, Some(suggestion.task))
                    .await?,
            );
        }

        Ok(appended)
    }

    /// Mark a suggested task as done and acknowledge it in the conversation.
    /// Suggestions without a title are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if progress cannot be stored.
    pub async fn handle_task_action(
        &self,
        task: &TaskSuggestion,
    ) -> Result<Option<ChatMessage>, ChatError> {
        if task.title.trim().is_empty() {
            warn!(task_id = %task.task_id, "ignoring task action without a title");
            return Ok(None);
        }

        self.progress
            .mark_task_completed(task.task_id.as_str())
            .await?;
        let text = match task.kind {
            TaskKind::Quiz => format!(
                "Great! You completed the quiz \"{}\". Keep exploring new topics!",
                task.title
            ),
            TaskKind::Material => format!(
                "Material \"{}\" studied! Now you can put what you learned into practice.",
                task.title
            ),
        };
        Ok(Some(self.append(Author::Tutor, &text, None).await?))
    }

    /// Conversation in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the history cannot be read.
    pub async fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.progress.messages().await?)
    }

    async fn complete(&self, text: &str) -> Result<String, ChatError> {
        let client = self.client.as_ref().ok_or(ChatError::Disabled)?;
        let request = [
            CompletionMessage::new(CompletionRole::System, SYSTEM_PROMPT),
            CompletionMessage::new(CompletionRole::User, text),
        ];
        client.complete(&request).await
    }

    async fn append(
        &self,
        author: Author,
        text: &str,
        task: Option<TaskSuggestion>,
    ) -> Result<ChatMessage, ChatError> {
        let mut message = ChatMessage::new(MessageId::random(), author, text, self.clock.now())
            .map_err(ProgressError::from)?;
        if let Some(task) = task {
            message = message.with_task(task);
        }
        self.progress.append_message(&message).await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storage::catalog::InMemoryCatalog;
    use storage::repository::Storage;
    use tutor_core::model::TaskId;
    use tutor_core::time::fixed_clock;

    struct Canned {
        reply: Option<&'static str>,
        seen: Mutex<Vec<CompletionMessage>>,
    }

    #[async_trait]
    impl CompletionClient for Canned {
        async fn complete(&self, messages: &[CompletionMessage]) -> Result<String, ChatError> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            self.reply.map(str::to_owned).ok_or(ChatError::EmptyResponse)
        }
    }

    fn chat(reply: Option<&'static str>) -> (TutorChatService, Arc<Canned>, Arc<ProgressService>) {
        let progress = Arc::new(ProgressService::from_storage(
            fixed_clock(),
            &Storage::in_memory(),
        ));
        let client = Arc::new(Canned {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let service = TutorChatService::new(
            fixed_clock(),
            Arc::clone(&progress),
            Arc::new(InMemoryCatalog::sample().unwrap()),
            Some(Arc::clone(&client) as Arc<dyn CompletionClient>),
        );
        (service, client, progress)
    }

    #[tokio::test]
    async fn reply_and_suggestions_follow_the_question() {
        let (service, client, _) = chat(Some("An atom is the smallest unit of matter."));
        let appended = service.send_message("  what is an atom?  ").await.unwrap();

        assert_eq!(appended.len(), 3);
        assert!(appended[0].is_user());
        assert_eq!(appended[0].text(), "what is an atom?");
        assert_eq!(appended[1].author(), Author::Tutor);
        assert_eq!(
            appended[2].task().map(|t| t.task_id.as_str()),
            Some("atomic-structure")
        );

        let seen = client.seen.lock().unwrap().clone();
        assert_eq!(seen[0].role, CompletionRole::System);
        assert_eq!(seen[1].content, "what is an atom?");
        assert_eq!(service.history().await.unwrap(), appended);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let (service, client, _) = chat(Some("unused"));
        assert!(service.send_message("   ").await.unwrap().is_empty());
        assert!(client.seen.lock().unwrap().is_empty());
        assert!(service.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_completion_keeps_only_user_message() {
        let (service, _, _) = chat(None);
        let appended = service.send_message("physics please").await.unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(service.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_chat_keeps_only_user_message() {
        let progress = Arc::new(ProgressService::from_storage(
            fixed_clock(),
            &Storage::in_memory(),
        ));
        let service = TutorChatService::new(
            fixed_clock(),
            progress,
            Arc::new(InMemoryCatalog::sample().unwrap()),
            None,
        );
        assert!(!service.enabled());
        assert_eq!(service.send_message("hello").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn task_action_marks_completion_and_confirms() {
        let (service, _, progress) = chat(Some("Forces change motion."));
        let appended = service.send_message("physics").await.unwrap();
        let task = appended
            .iter()
            .find_map(|m| m.task())
            .cloned()
            .unwrap();

        let confirmation = service.handle_task_action(&task).await.unwrap().unwrap();
        assert!(confirmation.text().contains(&task.title));
        assert!(progress.is_task_completed(&task.task_id).await.unwrap());

        let mut untitled = task.clone();
        untitled.title = " ".into();
        untitled.task_id = TaskId::new("other").unwrap();
        assert!(service.handle_task_action(&untitled).await.unwrap().is_none());
        assert!(!progress.is_task_completed(&untitled.task_id).await.unwrap());
    }
}
