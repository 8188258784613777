//! Narration provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::{ChatConfig, DEFAULT_API_KEY, DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL};
use crate::remote::{DEFAULT_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_TEMPERATURE, RetryPolicy};

/// LM Studio's local server.
pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

/// Ollama's OpenAI-compatible endpoint.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Which narrator to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Offline template narrator.
    #[default]
    Local,
    /// Hosted OpenAI or any server set through `base_url`.
    OpenAI,
    /// LM Studio on its default port.
    LmStudio,
    /// Ollama on its default port.
    Ollama,
}

impl ProviderKind {
    pub fn is_remote(self) -> bool {
        self != Self::Local
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::LmStudio => LMSTUDIO_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
            Self::Local | Self::OpenAI => DEFAULT_CHAT_BASE_URL,
        }
    }

    fn default_api_key(self) -> &'static str {
        match self {
            Self::LmStudio => "lm-studio",
            Self::Ollama => "ollama",
            Self::Local | Self::OpenAI => DEFAULT_API_KEY,
        }
    }
}

/// Configuration for the narration provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub provider: ProviderKind,

    /// Overrides the provider's default base URL.
    pub base_url: Option<String>,

    /// Overrides the provider's default API key.
    pub api_key: Option<String>,

    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,

    /// Backoff unit in milliseconds.
    pub backoff_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl NarrationConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_ms = backoff_ms;
        self
    }

    /// Connection settings with provider presets applied.
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string()),
            model: self.model.clone(),
            api_key: self
                .api_key
                .clone()
                .unwrap_or_else(|| self.provider.default_api_key().to_string()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets() {
        let lmstudio = NarrationConfig::new(ProviderKind::LmStudio).chat_config();
        assert_eq!(lmstudio.base_url, "http://localhost:1234/v1");
        assert_eq!(lmstudio.api_key, "lm-studio");

        let ollama = NarrationConfig::new(ProviderKind::Ollama).chat_config();
        assert_eq!(ollama.base_url, "http://localhost:11434/v1");
        assert_eq!(ollama.api_key, "ollama");

        let openai = NarrationConfig::new(ProviderKind::OpenAI).chat_config();
        assert_eq!(openai.api_key, "sk-local");
        assert_eq!(openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_overrides_win_over_presets() {
        let config = NarrationConfig::new(ProviderKind::Ollama)
            .with_base_url("http://gpu-box:11434/v1")
            .with_api_key("secret")
            .with_model("llama3.1");
        let chat = config.chat_config();
        assert_eq!(chat.base_url, "http://gpu-box:11434/v1");
        assert_eq!(chat.api_key, "secret");
        assert_eq!(chat.model, "llama3.1");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: NarrationConfig =
            serde_json::from_str(r#"{"provider": "lmstudio", "max_retries": 4}"#).unwrap();
        assert_eq!(config.provider, ProviderKind::LmStudio);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.backoff_ms, 300);
        assert_eq!(config.retry_policy().backoff_base, Duration::from_millis(300));
        assert!(config.provider.is_remote());
    }
}
