//! HTTP request handlers for the recommendation server.
//!
//! Implements recommendation generation and health check endpoints using
//! axum, with permissive CORS so browser extensions can call in directly.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use fieldsage_orchestrator::{
    Orchestrator, OrchestratorError, RecommendationRequest, RecommendationResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Error text for a body that does not carry a field list
pub const FIELDS_REQUIRED: &str = "Fields array is required";

/// Error text when no model key was configured
pub const KEY_NOT_CONFIGURED: &str = "AI API key not configured";

/// Shared application state
#[derive(Clone, Default)]
pub struct AppState {
    /// Recommendation pipeline; absent when the model gateway has no key
    pub orchestrator: Option<Arc<Orchestrator>>,
}

impl AppState {
    /// State serving recommendations through `orchestrator`
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Some(Arc::new(orchestrator)),
        }
    }

    /// State that answers every recommendation request with a credentials error
    pub fn unconfigured() -> Self {
        Self::default()
    }

    fn search_enabled(&self) -> bool {
        self.orchestrator
            .as_ref()
            .is_some_and(|o| o.grounding_enabled())
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy" when a model is configured, "degraded" otherwise
    pub status: String,
    /// A model gateway key is present
    pub llm_configured: bool,
    /// Recommendations are grounded with web search
    pub search_enabled: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Upstream body for gateway failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Model text that could not be parsed
    #[serde(
        default,
        rename = "rawContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_content: Option<String>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            raw_content: None,
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request body could not be decoded
    BadRequest(String),
    /// Recommendation pipeline failure
    Recommendation(OrchestratorError),
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        AppError::Recommendation(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::message(msg)),
            AppError::Recommendation(e) => match e {
                OrchestratorError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorResponse::message(msg))
                }
                OrchestratorError::RateLimited => {
                    (StatusCode::TOO_MANY_REQUESTS, ErrorResponse::message(e.to_string()))
                }
                OrchestratorError::QuotaExhausted => {
                    (StatusCode::PAYMENT_REQUIRED, ErrorResponse::message(e.to_string()))
                }
                OrchestratorError::Upstream { ref body, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        details: Some(body.clone()),
                        ..ErrorResponse::message(e.to_string())
                    },
                ),
                OrchestratorError::MalformedOutput { ref raw } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        raw_content: Some(raw.clone()),
                        ..ErrorResponse::message(e.to_string())
                    },
                ),
                OrchestratorError::MissingCredentials(_)
                | OrchestratorError::EmptyResponse
                | OrchestratorError::Communication(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::message(e.to_string()),
                ),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// POST /generate-recommendations - Recommend values for a batch of fields
async fn generate_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let request_id = Uuid::now_v7();
    let span = info_span!("generate_recommendations", %request_id);

    recommend(state, payload).instrument(span).await
}

async fn recommend(
    state: AppState,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let Some(orchestrator) = state.orchestrator.as_ref() else {
        error!("Model gateway key not configured");
        return Err(OrchestratorError::MissingCredentials(KEY_NOT_CONFIGURED.to_string()).into());
    };

    let Json(request) = payload.map_err(|e| {
        warn!("Rejected request body: {}", e);
        AppError::BadRequest(FIELDS_REQUIRED.to_string())
    })?;

    info!(
        fields = request.fields.len(),
        component = request.component_name.as_deref().unwrap_or(""),
        "Received recommendation request"
    );

    let response = orchestrator.recommend(request).await?;
    info!("Returning {} recommendations", response.recommendations.len());

    Ok(Json(response))
}

/// GET /health - Service health check
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let llm_configured = state.orchestrator.is_some();
    let status = if llm_configured { "healthy" } else { "degraded" };

    Json(HealthCheckResponse {
        status: status.to_string(),
        llm_configured,
        search_enabled: state.search_enabled(),
    })
}

/// CORS policy: any origin, plus the headers browser clients send
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/generate-recommendations", post(generate_recommendations))
        .route("/health", get(health_check))
        .layer(cors_layer())
        .with_state(state)
}
