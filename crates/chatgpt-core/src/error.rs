use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatGptError {
    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("conversation(id: {0}) not found")]
    ConversationNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatGptError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::ConversationNotFound(id.into())
    }

    /// True for failures that came from the completion API or its transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCall(_) | Self::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatGptError>;
