use chrono::{DateTime, Utc};
use std::time::Duration;

use super::builder::PromptBuilder;
use super::message::Message;
use crate::config::Config;
use crate::llm::ChatMessage;

/// Per-conversation overrides. Unset fields are filled from the client `Config`.
#[derive(Debug, Clone, Default)]
pub struct ConversationConfig {
    pub model: Option<String>,
    pub context: Option<String>,
    pub language: Option<String>,
    pub assistant_name: Option<String>,
    pub max_age: Option<Duration>,
}

impl ConversationConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = Some(name.into());
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

fn non_empty(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// State of one chat session: settings plus an append-only history.
///
/// Values handed out by `ConversationStore` are snapshots; changes go back
/// through the store by id.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    model: String,
    context: String,
    language: String,
    assistant_name: String,
    max_age: Duration,
    created_at: DateTime<Utc>,
    /// Set by the store on insertion; tells apart conversations reusing an id.
    generation: u64,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, config: ConversationConfig, defaults: &Config) -> Self {
        let max_age = config
            .max_age
            .filter(|age| !age.is_zero())
            .unwrap_or_else(|| defaults.conversation_max_age());

        Self {
            id: id.into(),
            model: non_empty(config.model, &defaults.model),
            context: non_empty(config.context, &defaults.conversation_context),
            language: non_empty(config.language, &defaults.conversation_language),
            assistant_name: non_empty(config.assistant_name, &defaults.chatgpt_name),
            max_age,
            created_at: Utc::now(),
            generation: 0,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn extend<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.messages.extend(messages);
    }

    /// Context with the reply-language instruction appended when one is set.
    pub fn full_context(&self) -> String {
        if self.language.is_empty() {
            self.context.clone()
        } else {
            format!("{}\nReply in {}.", self.context, self.language)
        }
    }

    /// Flattened prompt over this conversation's history.
    pub fn build_prompt(&self, date: &str, max_length: usize) -> String {
        PromptBuilder::new(self.full_context(), date)
            .with_assistant_name(&self.assistant_name)
            .with_max_length(max_length)
            .build(&self.messages)
    }

    /// Role-tagged history for chat models, led by a system message when
    /// there is context to carry.
    pub fn chat_messages(&self) -> Vec<Message> {
        let context = self.full_context();
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if !context.is_empty() {
            messages.push(Message::system(context));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

/// Role list consumed by the chat completion endpoint.
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages.iter().map(Message::to_chat_message).collect()
}
