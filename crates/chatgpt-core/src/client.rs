use crate::config::Config;
use crate::constants::{defaults, models, prompt::DATE_FORMAT};
use crate::context::{
    calc_max_response_tokens, to_chat_messages, Conversation, ConversationConfig,
    ConversationStore, Message,
};
use crate::error::{ChatGptError, Result};
use crate::llm::{ChatCompletionRequest, CompletionApi, CompletionRequest, OpenAIClient, Usage};

fn log_usage(model: &str, usage: Option<&Usage>) {
    if let Some(usage) = usage {
        tracing::debug!(
            model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "token usage"
        );
    }
}

/// One completion request.
///
/// Chat models read `messages`; every other model reads `prompt`.
#[derive(Debug, Clone, Default)]
pub struct AskConfig {
    pub model: String,
    pub prompt: String,
    pub messages: Vec<Message>,
    pub max_request_response_tokens: usize,
}

impl AskConfig {
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn chat(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Self::default()
        }
    }

    pub fn with_max_request_response_tokens(mut self, tokens: usize) -> Self {
        self.max_request_response_tokens = tokens;
        self
    }
}

/// Today's date as it appears in prompt headers.
pub fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

/// Conversation-aware front end to a `CompletionApi`.
pub struct Client {
    api: Box<dyn CompletionApi>,
    config: Config,
    conversations: ConversationStore,
}

impl Client {
    /// Build a client that talks to the OpenAI HTTP API.
    pub fn new(config: Config) -> Result<Self> {
        let config = config.normalized();

        let api_key = config.api_key().unwrap_or_else(|| {
            tracing::warn!("No API key configured; requests will be unauthenticated");
            String::new()
        });
        let mut api = OpenAIClient::new(api_key).with_base_url(&config.api_server);
        if let Some(ref proxy) = config.proxy {
            api = api.with_proxy(proxy)?;
        }

        Ok(Self::with_api(config, Box::new(api)))
    }

    /// Build a client over any `CompletionApi` implementation.
    pub fn with_api(config: Config, api: Box<dyn CompletionApi>) -> Self {
        let config = config.normalized();
        let conversations = ConversationStore::new(config.max_conversations);
        Self {
            api,
            config,
            conversations,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Send one request and return the trimmed answer. Remote failures are
    /// returned as-is.
    pub async fn ask(&self, request: &AskConfig) -> Result<String> {
        if models::is_chat_model(&request.model) {
            let length: usize = request.messages.iter().map(|m| m.text.len()).sum();
            let max_tokens = calc_max_response_tokens(
                length,
                request.max_request_response_tokens,
                self.config.max_response_tokens,
            );
            tracing::debug!(model = %request.model, length, max_tokens, "chat completion");

            let completion = self
                .api
                .create_chat_completion(&ChatCompletionRequest {
                    model: request.model.clone(),
                    messages: to_chat_messages(&request.messages),
                    max_tokens,
                    temperature: defaults::CHAT_TEMPERATURE,
                })
                .await?;
            log_usage(&request.model, completion.usage.as_ref());

            let choice = completion
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ChatGptError::RemoteCall("No choices in response".into()))?;
            return Ok(choice.message.content.unwrap_or_default().trim().to_string());
        }

        let max_tokens = calc_max_response_tokens(
            request.prompt.len(),
            request.max_request_response_tokens,
            self.config.max_response_tokens,
        );
        tracing::debug!(
            model = %request.model,
            length = request.prompt.len(),
            max_tokens,
            "text completion"
        );

        let completion = self
            .api
            .create_completion(&CompletionRequest {
                model: request.model.clone(),
                prompt: request.prompt.clone(),
                max_tokens,
            })
            .await?;
        log_usage(&request.model, completion.usage.as_ref());

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatGptError::RemoteCall("No choices in response".into()))?;
        Ok(choice.text.trim().to_string())
    }

    /// Existing live conversation for `id`, or a new one seeded from `config`
    /// and the client defaults. An existing conversation ignores `config`.
    pub fn get_or_create_conversation(&self, id: &str, config: ConversationConfig) -> Conversation {
        self.conversations
            .get_or_create(id, || Conversation::new(id, config, &self.config))
    }

    pub fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.conversations
            .get(id)
            .ok_or_else(|| ChatGptError::not_found(id))
    }

    pub fn reset_conversations(&self) {
        self.conversations.clear();
        tracing::info!("reset all conversations");
    }

    pub fn reset_conversation(&self, id: &str) {
        if self.conversations.remove(id) {
            tracing::info!(conversation = id, "reset conversation");
        }
    }

    pub fn change_conversation_model(&self, id: &str, model: &str) -> Result<()> {
        self.conversations.change_model(id, model)?;
        tracing::info!(conversation = id, model, "changed conversation model");
        Ok(())
    }

    /// Ask `question` within conversation `id` and record both turns.
    ///
    /// History is only extended once the answer arrives, so a failed call
    /// leaves the conversation untouched.
    pub async fn ask_conversation(
        &self,
        id: &str,
        question: &str,
        user: Option<&str>,
    ) -> Result<String> {
        let mut pending = self.get_conversation(id)?;
        let generation = pending.generation();
        let question = Message::user(question).with_user(user.unwrap_or_default());
        pending.push(question.clone());

        let mut request = if models::is_chat_model(pending.model()) {
            AskConfig::chat(pending.model(), pending.chat_messages())
        } else {
            let prompt_budget = self
                .config
                .max_request_response_tokens
                .saturating_sub(self.config.max_response_tokens);
            AskConfig::prompt(pending.model(), pending.build_prompt(&today(), prompt_budget))
        };
        request.max_request_response_tokens = self.config.max_request_response_tokens;

        let answer = self.ask(&request).await?;

        let turns = [question, Message::assistant(answer.clone())];
        if let Err(e) = self.conversations.append_if(id, generation, turns) {
            tracing::warn!(conversation = id, "answer not recorded: {}", e);
        }
        Ok(answer)
    }
}
