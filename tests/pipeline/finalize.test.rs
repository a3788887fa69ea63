// [tests/pipeline/finalize.test.rs]
//! Validation-path tests for the process and finalize stage endpoints:
//! both stages parse their payload and resolve provider kinds before ever
//! touching storage or enhancement backends (§4.4, §7), so malformed
//! input is rejected deterministically without any network activity.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use snapforge_pipeline::state::AppState;
use tower::ServiceExt;

fn test_state() -> AppState {
    AppState {
        dispatch_client: Client::new(),
        process_function_url: "http://127.0.0.1:1/process".to_string(),
        finalize_function_url: "http://127.0.0.1:1/finalize".to_string(),
    }
}

async fn post_json(router: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    (status, envelope)
}

#[tokio::test]
async fn finalize_rejects_missing_enhancement_ids() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let payload = json!({
        "listing_id": "L-1",
        "callback_webhook": "http://127.0.0.1:1/callback",
        "destination_folder": "/listings/L-1",
        "storage_provider": "path_addressed",
        "storage_credentials": {
            "kind": "path_addressed",
            "refresh_token": "r",
            "app_key": "k",
            "app_secret": "s",
        },
        "enhancement_provider": "poll_presigned",
        "enhancement_credentials": { "kind": "poll_presigned", "api_key": "key" },
    });
    let (status, envelope) = post_json(router, "/finalize", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["statusCode"], 400);
}

#[tokio::test]
async fn finalize_rejects_storage_credentials_with_the_wrong_discriminant() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let payload = json!({
        "listing_id": "L-1",
        "callback_webhook": "http://127.0.0.1:1/callback",
        "destination_folder": "/listings/L-1",
        "enhancement_ids": [{ "id": "ticket-1", "bracket_index": 0 }],
        "storage_provider": "path_addressed",
        "storage_credentials": {
            // id_addressed shape given for a path_addressed provider kind
            "kind": "id_addressed",
            "client_id": "c",
            "client_secret": "s",
            "refresh_token": "r",
        },
        "enhancement_provider": "poll_presigned",
        "enhancement_credentials": { "kind": "poll_presigned", "api_key": "key" },
    });
    let (status, envelope) = post_json(router, "/finalize", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["statusCode"], 400);
}

#[tokio::test]
async fn process_rejects_missing_brackets_data() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let payload = json!({
        "job_id": uuid::Uuid::new_v4().to_string(),
        "listing_id": "L-2",
        "correlation_id": uuid::Uuid::new_v4().to_string(),
        "callback_webhook": "http://127.0.0.1:1/callback",
        "destination_folder": "/listings/L-2",
        "storage_provider": "path_addressed",
        "storage_credentials": {
            "kind": "path_addressed",
            "refresh_token": "r",
            "app_key": "k",
            "app_secret": "s",
        },
        "enhancement_provider": "poll_presigned",
        "enhancement_credentials": { "kind": "poll_presigned", "api_key": "key" },
    });
    let (status, envelope) = post_json(router, "/process", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["statusCode"], 400);
}

#[tokio::test]
async fn process_rejects_an_invalid_job_id() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let payload = json!({
        "job_id": "not-a-uuid",
        "listing_id": "L-2",
        "correlation_id": uuid::Uuid::new_v4().to_string(),
        "callback_webhook": "http://127.0.0.1:1/callback",
        "destination_folder": "/listings/L-2",
        "brackets_data": [],
        "storage_provider": "path_addressed",
        "storage_credentials": {
            "kind": "path_addressed",
            "refresh_token": "r",
            "app_key": "k",
            "app_secret": "s",
        },
        "enhancement_provider": "poll_presigned",
        "enhancement_credentials": { "kind": "poll_presigned", "api_key": "key" },
    });
    let (status, _envelope) = post_json(router, "/process", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
