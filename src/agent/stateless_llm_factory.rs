use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::agent::stateless_llm::gemini_llm::{GeminiLLM, GEMINI_BASE_URL};
use crate::agent::stateless_llm::openai_compatible_llm::{
    OpenAICompatibleLLM, DEFAULT_OPENAI_COMPATIBLE_BASE_URL,
};
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::config::LLMConfig;

/// Extra time the HTTP client allows past the chat service's bound.
/// The service bound must expire first.
const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create the provider named by `config.provider`.
    /// The HTTP client only tears down sockets the chat service has already
    /// given up on.
    pub fn create_llm(config: &LLMConfig) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM: {}", config.provider);

        let bound = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(bound)
            .timeout(bound + CLIENT_TIMEOUT_GRACE)
            .build()
            .context("Failed to build HTTP client")?;

        match config.provider.as_str() {
            "openai_compatible_llm" | "openai_llm" | "llama_cpp_llm" | "ollama_llm"
            | "lmstudio_llm" | "deepseek_llm" | "groq_llm" | "mistral_llm" => {
                Ok(Arc::new(OpenAICompatibleLLM::new(
                    client,
                    config.provider.clone(),
                    config.model.clone(),
                    Self::base_url_for(config),
                    config.llm_api_key.clone().filter(|k| !k.is_empty()),
                    config.temperature,
                    config.max_tokens,
                )))
            }
            "gemini_llm" => {
                let api_key = config
                    .llm_api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| anyhow::anyhow!("gemini_llm requires llm_api_key"))?;
                Ok(Arc::new(GeminiLLM::new(
                    client,
                    config.model.clone(),
                    Self::base_url_for(config),
                    api_key,
                    config.temperature,
                    config.max_tokens,
                )))
            }
            _ => Err(anyhow::anyhow!("Unsupported LLM provider: {}", config.provider)),
        }
    }

    /// Configured endpoint, or the provider's own default when unset
    pub fn base_url_for(config: &LLMConfig) -> String {
        match (&config.base_url, config.provider.as_str()) {
            (Some(url), _) => url.clone(),
            (None, "gemini_llm") => GEMINI_BASE_URL.to_string(),
            (None, _) => DEFAULT_OPENAI_COMPATIBLE_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_providers_share_the_openai_client() {
        for provider in ["openai_compatible_llm", "llama_cpp_llm", "ollama_llm"] {
            let config = LLMConfig {
                provider: provider.to_string(),
                ..LLMConfig::default()
            };
            let llm = StatelessLLMFactory::create_llm(&config).unwrap();
            assert_eq!(llm.name(), provider);
            assert_eq!(llm.model(), "lm");
        }
    }

    #[test]
    fn gemini_needs_an_api_key() {
        let mut config = LLMConfig {
            provider: "gemini_llm".to_string(),
            model: "gemini-2.5-flash".to_string(),
            ..LLMConfig::default()
        };
        assert!(StatelessLLMFactory::create_llm(&config).is_err());

        config.llm_api_key = Some("key".to_string());
        let llm = StatelessLLMFactory::create_llm(&config).unwrap();
        assert_eq!(llm.name(), "gemini_llm");
    }

    #[test]
    fn explicit_base_url_is_kept_for_gemini() {
        let config = LLMConfig {
            provider: "gemini_llm".to_string(),
            base_url: Some("http://localhost:9006/v1".to_string()),
            llm_api_key: Some("key".to_string()),
            ..LLMConfig::default()
        };
        assert_eq!(
            StatelessLLMFactory::base_url_for(&config),
            "http://localhost:9006/v1"
        );

        let config = LLMConfig {
            base_url: None,
            ..config
        };
        assert_eq!(StatelessLLMFactory::base_url_for(&config), GEMINI_BASE_URL);

        let config = LLMConfig::default();
        assert_eq!(
            StatelessLLMFactory::base_url_for(&config),
            DEFAULT_OPENAI_COMPATIBLE_BASE_URL
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = LLMConfig {
            provider: "carrier_pigeon".to_string(),
            ..LLMConfig::default()
        };
        let err = StatelessLLMFactory::create_llm(&config).err().unwrap();
        assert!(err.to_string().contains("carrier_pigeon"));
    }
}
