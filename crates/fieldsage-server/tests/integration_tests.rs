//! Integration tests for the recommendation server

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fieldsage_llm::{LlmError, MockChatModel};
use fieldsage_orchestrator::{Orchestrator, OrchestratorConfig, NAME_REQUIRED_MESSAGE};
use fieldsage_search::{MockSearch, SearchResponse};
use fieldsage_server::handlers::{
    create_router, AppState, ErrorResponse, HealthCheckResponse, FIELDS_REQUIRED,
    KEY_NOT_CONFIGURED,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

const MONGO_LIFECYCLE: &str = "https://www.mongodb.com/legal/support-policy/lifecycles";

/// Helper to build a router over mock providers
fn create_test_app(model: &MockChatModel, search: Option<&MockSearch>) -> Router {
    let mut orchestrator = Orchestrator::new(Arc::new(model.clone()), OrchestratorConfig::default());
    if let Some(search) = search {
        orchestrator = orchestrator.with_search(Arc::new(search.clone()));
    }
    create_router(AppState::new(orchestrator))
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-recommendations")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let search = MockSearch::new();
    let app = create_test_app(&MockChatModel::default(), Some(&search));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthCheckResponse = body_json(response).await;
    assert_eq!(health.status, "healthy");
    assert!(health.llm_configured);
    assert!(health.search_enabled);
}

#[tokio::test]
async fn test_health_check_unconfigured() {
    let app = create_router(AppState::unconfigured());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let health: HealthCheckResponse = body_json(app.oneshot(request).await.unwrap()).await;
    assert_eq!(health.status, "degraded");
    assert!(!health.llm_configured);
    assert!(!health.search_enabled);
}

#[tokio::test]
async fn test_generate_recommendations_end_to_end() {
    let search = MockSearch::new().with_result(
        Some("mongodb.com"),
        "end of support",
        SearchResponse::new("Support ends 2028-08-31.", vec![MONGO_LIFECYCLE.to_string()]),
    );
    let model = MockChatModel::new(
        r#"[
          {"fieldId": "eos", "recommendation": "2028-08-31", "confidence": 0.9, "reasoning": "Vendor lifecycle page"},
          {"fieldId": "eosUrl", "recommendation": "https://example.com/guess", "confidence": 0.8}
        ]"#,
    );
    let app = create_test_app(&model, Some(&search));

    let response = app
        .oneshot(post_json(json!({
            "fields": [
                {"fieldId": "name", "fieldName": "Name", "currentValue": "MongoDB Community Server 8.2"},
                {"fieldId": "eos", "fieldName": "End of Support Date", "currentValue": ""},
                {"fieldId": "eosUrl", "fieldName": "End of Support URL", "currentValue": ""}
            ],
            "pageContext": "MongoDB Community Server 8.2",
            "componentName": "MongoDB Community Server 8.2"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;

    let recs = body["recommendations"].as_array().unwrap();
    let ids: Vec<&str> = recs.iter().map(|r| r["fieldId"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["name", "eos", "eosUrl"]);
    assert_eq!(recs[0]["recommendation"], "MongoDB Community Server 8.2");
    assert_eq!(recs[1]["recommendation"], "2028-08-31");
    assert_eq!(recs[2]["recommendation"], MONGO_LIFECYCLE);
    assert_eq!(
        body["cachedUrls"]["end_of_support_date"],
        json!([MONGO_LIFECYCLE])
    );
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_cached_urls_round_trip_without_search() {
    let search = MockSearch::new();
    let model = MockChatModel::new(
        r#"[{"fieldId": "eosUrl", "recommendation": null, "confidence": 0.2}]"#,
    );
    let app = create_test_app(&model, Some(&search));

    let response = app
        .oneshot(post_json(json!({
            "fields": [
                {"fieldId": "eosUrl", "fieldName": "End of Support URL", "currentValue": ""}
            ],
            "componentName": "MongoDB Community Server 8.2",
            "cachedUrls": {"end_of_support_date": [MONGO_LIFECYCLE]}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body["recommendations"][0]["recommendation"], MONGO_LIFECYCLE);
    assert_eq!(body["cachedUrls"]["end_of_support_date"][0], MONGO_LIFECYCLE);
    assert_eq!(search.call_count(), 0);
}

#[tokio::test]
async fn test_cached_urls_merge_across_slots() {
    let search = MockSearch::new().with_result(
        Some("mongodb.com"),
        "end of support",
        SearchResponse::new("Support ends 2028-08-31.", vec![MONGO_LIFECYCLE.to_string()]),
    );
    let model = MockChatModel::new(
        r#"[{"fieldId": "eos", "recommendation": "2028-08-31", "confidence": 0.9}]"#,
    );
    let app = create_test_app(&model, Some(&search));

    let response = app
        .oneshot(post_json(json!({
            "fields": [
                {"fieldId": "eos", "fieldName": "End of Support Date", "currentValue": ""}
            ],
            "componentName": "MongoDB Community Server 8.2",
            "cachedUrls": {"active_date": ["https://www.mongodb.com/try/download/community"]}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(
        body["cachedUrls"]["active_date"],
        json!(["https://www.mongodb.com/try/download/community"])
    );
    assert_eq!(body["cachedUrls"]["end_of_support_date"], json!([MONGO_LIFECYCLE]));
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn test_missing_name_short_circuits() {
    let model = MockChatModel::default();
    let app = create_test_app(&model, None);

    let response = app
        .oneshot(post_json(json!({
            "fields": [
                {"fieldId": "name", "fieldName": "Name", "currentValue": ""},
                {"fieldId": "desc", "fieldName": "Description", "currentValue": ""}
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(body["recommendations"][0]["reasoning"], NAME_REQUIRED_MESSAGE);
    assert!(body["recommendations"][0]["recommendation"].is_null());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_is_bad_request() {
    let app = create_test_app(&MockChatModel::default(), None);

    let response = app
        .oneshot(post_json(json!({"pageContext": "Catalog"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.error, FIELDS_REQUIRED);
}

#[tokio::test]
async fn test_duplicate_field_ids_are_bad_request() {
    let model = MockChatModel::default();
    let app = create_test_app(&model, None);

    let response = app
        .oneshot(post_json(json!({
            "fields": [
                {"fieldId": "desc", "fieldName": "Description", "currentValue": ""},
                {"fieldId": "desc", "fieldName": "Description", "currentValue": ""}
            ],
            "componentName": "MongoDB Community Server 8.2"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_key() {
    let app = create_router(AppState::unconfigured());

    let response = app
        .oneshot(post_json(json!({"fields": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.error, KEY_NOT_CONFIGURED);
}

async fn error_for(llm_error: LlmError) -> (StatusCode, ErrorResponse) {
    let model = MockChatModel::default();
    model.push_error(llm_error);
    let app = create_test_app(&model, None);

    let response = app
        .oneshot(post_json(json!({
            "fields": [{"fieldId": "desc", "fieldName": "Description", "currentValue": ""}],
            "componentName": "MongoDB Community Server 8.2"
        })))
        .await
        .unwrap();

    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_rate_limit_maps_to_429() {
    let (status, error) = error_for(LlmError::RateLimitExceeded).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error.error, "Rate limit exceeded. Please try again later.");
}

#[tokio::test]
async fn test_quota_maps_to_402() {
    let (status, _) = error_for(LlmError::QuotaExhausted).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_upstream_failure_carries_details() {
    let (status, error) = error_for(LlmError::Upstream {
        status: 503,
        body: "gateway overloaded".to_string(),
    })
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.error, "Failed to get AI recommendations");
    assert_eq!(error.details.as_deref(), Some("gateway overloaded"));
    assert!(error.raw_content.is_none());
}

#[tokio::test]
async fn test_empty_content() {
    let (status, error) = error_for(LlmError::EmptyContent).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.error, "No content in AI response");
}

#[tokio::test]
async fn test_unparsable_output_returns_raw_content() {
    let model = MockChatModel::new("I am not able to help with that.");
    let app = create_test_app(&model, None);

    let response = app
        .oneshot(post_json(json!({
            "fields": [{"fieldId": "desc", "fieldName": "Description", "currentValue": ""}],
            "componentName": "MongoDB Community Server 8.2"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = body_json(response).await;
    assert_eq!(body["error"], "Failed to parse AI recommendations");
    assert_eq!(body["rawContent"], "I am not able to help with that.");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_router(AppState::unconfigured());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/generate-recommendations")
        .header("origin", "chrome-extension://abc")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type, apikey")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let allowed = headers["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed.contains("apikey"));
    assert!(allowed.contains("x-client-info"));
}

#[tokio::test]
async fn test_cors_header_on_errors() {
    let app = create_router(AppState::unconfigured());

    let mut request = post_json(json!({"fields": []}));
    request
        .headers_mut()
        .insert("origin", "chrome-extension://abc".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
