/// Centralized constants.
/// Model names, endpoints, default limits and prompt markers live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const GPT3_5_TURBO: &str = "gpt-3.5-turbo";
    pub const GPT3_5_TURBO_0301: &str = "gpt-3.5-turbo-0301";
    pub const TEXT_DAVINCI_003: &str = "text-davinci-003";

    /// Models that take a role-tagged message list instead of a flat prompt.
    pub const CHAT_MODELS: &[&str] = &[GPT3_5_TURBO, GPT3_5_TURBO_0301];

    pub fn is_chat_model(model: &str) -> bool {
        CHAT_MODELS.contains(&model)
    }
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const COMPLETIONS_PATH: &str = "/v1/completions";
    pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

    /// Proxy schemes the transport accepts.
    pub const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5"];
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const MAX_RESPONSE_TOKENS: usize = 500;
    pub const MAX_REQUEST_RESPONSE_TOKENS: usize = 4000;
    pub const MAX_CONVERSATIONS: usize = 100;
    /// Seconds.
    pub const CONVERSATION_MAX_AGE: u64 = 60 * 60;
    pub const ASSISTANT_NAME: &str = "ChatGPT";
    pub const MODEL: &str = super::models::TEXT_DAVINCI_003;
    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
    pub const CHAT_TEMPERATURE: f32 = 0.1;
}

// ─── Prompt Markers ───────────────────────────────────────────────────────────

pub mod prompt {
    pub const END_OF_TEXT: &str = "<|endoftext|>\n\n";
    pub const DEFAULT_SPEAKER: &str = "User";
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}
