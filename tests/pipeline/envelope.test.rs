// [tests/pipeline/envelope.test.rs]
//! Router-level tests for the gateway and discovery stage endpoints:
//! envelope unwrapping, validation failures, and the gateway's
//! acknowledge-before-dispatch contract (§5, §6, §8).

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fernet::Fernet;
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

fn set_tenant_key(tenant: &str) -> String {
    let key = Fernet::generate_key();
    std::env::set_var(
        format!("CLIENT_{}_ENCRYPTION_KEY", tenant.to_ascii_uppercase()),
        &key,
    );
    key
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
async fn gateway_rejects_missing_required_field_with_400() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let (status, envelope) = post_json(router, "/gateway", json!({ "listing_id": "L1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["statusCode"], 400);
}

#[tokio::test]
async fn gateway_acknowledges_within_budget_even_with_an_unreachable_process_target() {
    let key = set_tenant_key("gwacme");
    let fernet = Fernet::new(&key).unwrap();

    let payload = json!({
        "client_id": "gwacme",
        "listing_id": "L-100",
        "callback_webhook": "http://127.0.0.1:1/callback",
        "destination_folder": "/listings/L-100",
        "brackets_data": [[
            { "logical_id": "/l100/a.jpg", "display_name": "a.jpg" },
            { "logical_id": "/l100/b.jpg", "display_name": "b.jpg" },
        ]],
        "dropbox_refresh_token_encrypted": fernet.encrypt(b"refresh"),
        "dropbox_app_key_encrypted": fernet.encrypt(b"app-key"),
        "dropbox_app_secret_encrypted": fernet.encrypt(b"app-secret"),
        "fotello_api_key_encrypted": fernet.encrypt(b"fotello-key"),
    });

    let router = snapforge_pipeline::routes::build_router(test_state());
    let (status, envelope) = tokio::time::timeout(Duration::from_secs(2), post_json(router, "/gateway", payload))
        .await
        .expect("gateway must acknowledge well within its timeout budget");

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(envelope["statusCode"], 202);
    let body: Value = serde_json::from_str(envelope["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["status"], "dispatched");
    assert_eq!(body["total_brackets"], 1);
    assert_eq!(body["total_files"], 2);
}

#[tokio::test]
async fn discovery_make_bracket_groups_the_literal_scenario() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let payload = json!({
        "mode": "make_bracket",
        "time_delta_seconds": 2.0,
        "aggregated_metadata": [
            { "name": "a.jpg", "path_lower": "/a.jpg", "date_taken": "2024:01:01 10:00:00" },
            { "name": "b.jpg", "path_lower": "/b.jpg", "date_taken": "2024:01:01 10:00:01" },
            { "name": "c.jpg", "path_lower": "/c.jpg", "date_taken": "2024:01:01 10:00:03" },
            { "name": "d.jpg", "path_lower": "/d.jpg", "date_taken": "2024:01:01 10:00:04" },
            { "name": "e.jpg", "path_lower": "/e.jpg", "date_taken": "2024:01:01 10:00:24" },
        ],
    });
    let (status, envelope) = post_json(router, "/discovery", payload).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(envelope["body"].as_str().unwrap()).unwrap();
    let brackets = body.as_array().unwrap();
    assert_eq!(brackets.len(), 2);
    assert_eq!(brackets[0].as_array().unwrap().len(), 4);
    assert_eq!(brackets[1].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn discovery_rejects_unknown_mode() {
    let router = snapforge_pipeline::routes::build_router(test_state());
    let (status, _envelope) = post_json(router, "/discovery", json!({ "mode": "bogus" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
