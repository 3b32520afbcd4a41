use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{defaults, endpoints};
use crate::error::{ChatGptError, Result};

/// Client-level configuration. Every field has a documented default, so a
/// partial `config.toml` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Falls back to `OPENAI_API_KEY` when empty.
    pub api_key: String,
    /// Default: `https://api.openai.com`.
    pub api_server: String,
    /// `http://`, `https://` or `socks5://` proxy for every request.
    pub proxy: Option<String>,
    /// Model used for new conversations. Default: `text-davinci-003`.
    pub model: String,
    /// Floor for the response allotment. Default: 500.
    pub max_response_tokens: usize,
    /// Combined request + response budget. Default: 4000.
    pub max_request_response_tokens: usize,
    /// Live conversations kept before LRU eviction. Default: 100.
    pub max_conversations: usize,
    /// Conversation time-to-live in seconds. Default: 3600.
    pub conversation_max_age: u64,
    pub conversation_context: String,
    pub conversation_language: String,
    /// Assistant speaker name in prompts. Default: `ChatGPT`.
    pub chatgpt_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_server: endpoints::OPENAI_BASE_URL.to_string(),
            proxy: None,
            model: defaults::MODEL.to_string(),
            max_response_tokens: defaults::MAX_RESPONSE_TOKENS,
            max_request_response_tokens: defaults::MAX_REQUEST_RESPONSE_TOKENS,
            max_conversations: defaults::MAX_CONVERSATIONS,
            conversation_max_age: defaults::CONVERSATION_MAX_AGE,
            conversation_context: String::new(),
            conversation_language: String::new(),
            chatgpt_name: defaults::ASSISTANT_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatgpt")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ChatGptError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChatGptError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured key, or the `OPENAI_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(defaults::API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn conversation_max_age(&self) -> Duration {
        Duration::from_secs(self.conversation_max_age)
    }

    /// Replace zero or empty limits with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.api_server.is_empty() {
            self.api_server = endpoints::OPENAI_BASE_URL.to_string();
        }
        if self.model.is_empty() {
            self.model = defaults::MODEL.to_string();
        }
        if self.max_response_tokens == 0 {
            self.max_response_tokens = defaults::MAX_RESPONSE_TOKENS;
        }
        if self.max_request_response_tokens == 0 {
            self.max_request_response_tokens = defaults::MAX_REQUEST_RESPONSE_TOKENS;
        }
        if self.max_conversations == 0 {
            self.max_conversations = defaults::MAX_CONVERSATIONS;
        }
        if self.conversation_max_age == 0 {
            self.conversation_max_age = defaults::CONVERSATION_MAX_AGE;
        }
        if self.chatgpt_name.is_empty() {
            self.chatgpt_name = defaults::ASSISTANT_NAME.to_string();
        }
        if self.proxy.as_deref().is_some_and(str::is_empty) {
            self.proxy = None;
        }
        self
    }
}
