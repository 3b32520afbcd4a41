use crate::constants::endpoints;
use crate::error::{ChatGptError, Result};
use crate::llm::traits::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// `CompletionApi` over the OpenAI HTTP API.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Route every request through `proxy` (`http://`, `https://` or `socks5://`).
    pub fn with_proxy(mut self, proxy: &str) -> Result<Self> {
        let url = reqwest::Url::parse(proxy)
            .map_err(|e| ChatGptError::Config(format!("invalid proxy url {proxy}: {e}")))?;

        if !endpoints::PROXY_SCHEMES.contains(&url.scheme()) {
            return Err(ChatGptError::Config(format!(
                "unsupported proxy scheme '{}' (expected one of: {})",
                url.scheme(),
                endpoints::PROXY_SCHEMES.join(", ")
            )));
        }

        let proxy = reqwest::Proxy::all(url)
            .map_err(|e| ChatGptError::Config(format!("invalid proxy: {e}")))?;
        self.client = reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| ChatGptError::Config(format!("failed to build http client: {e}")))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ChatGptError::RemoteCall(format!(
                "OpenAI API error ({}): {}",
                status, response_text
            )));
        }

        serde_json::from_str(&response_text)
            .map_err(|e| ChatGptError::RemoteCall(format!("Failed to parse response: {e}")))
    }
}

#[async_trait::async_trait]
impl CompletionApi for OpenAIClient {
    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.post(endpoints::COMPLETIONS_PATH, request).await
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.post(endpoints::CHAT_COMPLETIONS_PATH, request).await
    }
}
