use std::sync::Arc;

use crate::agent::chat_service::ChatService;
use crate::agent::stateless_llm_factory::StatelessLLMFactory;
use crate::config::Config;

/// Shared, read-only application state. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat_service: Arc<ChatService>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = StatelessLLMFactory::create_llm(&config.llm)?;
        let chat_service = ChatService::from_config(llm, &config);
        Ok(Self::with_service(config, chat_service))
    }

    pub fn with_service(config: Config, chat_service: ChatService) -> Self {
        Self {
            config: Arc::new(config),
            chat_service: Arc::new(chat_service),
        }
    }
}
