use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::agent::system_prompt::DEFAULT_RESPONSE_LANGUAGE;

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("env placeholder pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Structured-generation provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// e.g. "openai_compatible_llm", "llama_cpp_llm", "ollama_llm", "gemini_llm"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Unset means the provider's own endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub llm_api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai_compatible_llm".to_string()
}

fn default_model() -> String {
    "lm".to_string()
}

fn default_temperature() -> f32 {
    1.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            llm_api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_response_language")]
    pub response_language: String,
    /// Replaces the built-in system instruction entirely
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_response_language() -> String {
    DEFAULT_RESPONSE_LANGUAGE.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            response_language: default_response_language(),
            system_prompt: None,
        }
    }
}

/// Replace `${VAR_NAME}` with the value of the environment variable.
/// Unset variables are left as written.
pub fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;

        let path_lower = path.to_lowercase();
        let is_json = path_lower.ends_with(".json") || path_lower.ends_with(".jsonld");
        Self::parse(&content, is_json).with_context(|| format!("Invalid configuration in {}", path))
    }

    /// Parse configuration text, JSON or YAML, after env substitution
    pub fn parse(content: &str, is_json: bool) -> Result<Self> {
        let content = substitute_env_vars(content);
        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Candidate config files, in lookup order
    pub fn search_paths() -> Vec<String> {
        vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.yml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
