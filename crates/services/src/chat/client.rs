use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionMessage {
    #[must_use]
    pub fn new(role: CompletionRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Language-model endpoint that turns a conversation into a reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// # Errors
    ///
    /// Returns `ChatError` if the request fails or yields no text.
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String, ChatError>;
}

/// `CompletionClient` speaking `{"messages": [...]}` -> `{"completion": "..."}` over HTTP.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    url: String,
}

impl HttpCompletionClient {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [CompletionMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: Option<String>,
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .json(&CompletionRequest { messages })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::HttpStatus(response.status()));
        }

        let body: CompletionResponse = response.json().await?;
        body.completion
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}
