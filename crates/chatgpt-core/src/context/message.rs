use crate::constants::prompt::DEFAULT_SPEAKER;
use crate::llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// A single turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    /// Written by the assistant rather than a caller.
    #[serde(default)]
    pub is_assistant: bool,
    /// Display name that replaces `User` in flattened prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub role: Role,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_assistant: false,
            user: None,
            role: Role::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_assistant: true,
            user: None,
            role: Role::Assistant,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_assistant: false,
            user: None,
            role: Role::System,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() { None } else { Some(user) };
        self
    }

    /// Speaker line used in a flattened prompt, without the separator.
    pub fn render(&self, assistant_name: &str) -> String {
        let speaker = if self.is_assistant {
            assistant_name
        } else {
            self.user.as_deref().unwrap_or(DEFAULT_SPEAKER)
        };
        format!("{}:\n\n{}", speaker, self.text)
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.text.clone(),
        }
    }
}
