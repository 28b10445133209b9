//! Fieldsage Server
//!
//! HTTP surface for the recommendation pipeline. A browser extension posts
//! the fields it scraped and gets back suggested values plus the lifecycle
//! URL cache to send with its next request.
//!
//! # Endpoints
//!
//! - `POST /generate-recommendations`: body `{fields, pageContext?,
//!   componentName?, cachedUrls?}`, answer `{recommendations, cachedUrls}`
//!   or `{error, details?, rawContent?}` with a non-2xx status
//! - `GET /health`: `{status, llm_configured, search_enabled}`
//!
//! Both answer CORS preflight for any origin.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use fieldsage_llm::GatewayProvider;
use fieldsage_orchestrator::Orchestrator;
use fieldsage_search::SonarSearch;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A provider client could not be constructed
    #[error("Provider setup failed: {0}")]
    Provider(String),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build application state from configuration
///
/// Without a model key the state is unconfigured and recommendation calls
/// fail with a credentials error. Without a search key, or with search
/// disabled, recommendations are produced ungrounded.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let Some(llm_key) = config.llm.key() else {
        warn!("No model gateway key configured; recommendations are unavailable");
        return Ok(AppState::unconfigured());
    };

    let model = GatewayProvider::with_timeout(
        &config.llm.endpoint,
        &config.llm.model,
        llm_key,
        config.llm.timeout(),
    )
    .map_err(|e| ServerError::Provider(e.to_string()))?;

    let mut orchestrator = Orchestrator::new(Arc::new(model), config.orchestrator.clone());

    match (config.search.enabled, config.search.key()) {
        (true, Some(search_key)) => {
            let search = SonarSearch::new(
                &config.search.endpoint,
                &config.search.model,
                search_key,
                config.search.timeout(),
            )
            .map_err(|e| ServerError::Provider(e.to_string()))?;
            orchestrator = orchestrator.with_search(Arc::new(search));
        }
        (true, None) => warn!("No search key configured; recommendations will be ungrounded"),
        (false, _) => info!("Search grounding disabled by configuration"),
    }

    Ok(AppState::new(orchestrator))
}

/// Start the recommendation HTTP server
///
/// Builds the providers, then serves the axum router until the process is
/// stopped. Tracing must already be initialised.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Fieldsage server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {} via {}", config.llm.model, config.llm.endpoint);

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
