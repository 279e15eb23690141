mod client;
mod service;
mod suggestions;

pub use crate::error::ChatError;
pub use client::{CompletionClient, CompletionMessage, CompletionRole, HttpCompletionClient};
pub use service::{SYSTEM_PROMPT, TutorChatService};
pub use suggestions::{Suggestion, suggest_tasks};
