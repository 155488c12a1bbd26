mod agent;
mod config;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use agent::stateless_llm_factory::StatelessLLMFactory;
use config::Config;
use state::AppState;

fn load_config() -> Config {
    for path in Config::search_paths() {
        match Config::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from: {}", path);
                return config;
            }
            Err(e) => debug!("Failed to load config from {}: {:#}", path, e),
        }
    }
    warn!("No configuration file found; using built-in defaults");
    Config::default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agui_server=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config();
    info!(
        "Using provider {} (model={}, base_url={}, timeout={}s)",
        config.llm.provider,
        config.llm.model,
        StatelessLLMFactory::base_url_for(&config.llm),
        config.llm.timeout_secs
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let app_state = AppState::new(config)?;
    let app = routes::create_app(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
