pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod llm;

// Re-export key types
pub use client::{AskConfig, Client};
pub use config::Config;
pub use context::{
    calc_max_response_tokens, Conversation, ConversationConfig, ConversationStore, Message,
    PromptBuilder,
};
pub use error::{ChatGptError, Result};
pub use llm::{CompletionApi, OpenAIClient, Role};
