mod budget;
mod builder;
mod conversation;
mod message;
mod store;

pub use budget::calc_max_response_tokens;
pub use builder::PromptBuilder;
pub use conversation::{to_chat_messages, Conversation, ConversationConfig};
pub use message::Message;
pub use store::ConversationStore;
