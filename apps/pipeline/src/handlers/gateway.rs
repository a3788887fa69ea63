// [apps/pipeline/src/handlers/gateway.rs]
//! The gateway stage (§4.4, §6): parses and validates the inbound
//! request, decrypts credentials, acknowledges synchronously, and
//! dispatches the process stage on a detached background task.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use snapforge_credentials::decrypt_credentials;
use snapforge_models::FileReference;
use snapforge_notify::{EventSeverity, VerbosityLevel, WebhookNotifier};
use tracing::info;
use uuid::Uuid;

use crate::envelope::{optional_str, require_str, sanitize_filename_prefix, stage_response, unwrap_envelope};
use crate::error::PipelineError;
use crate::services::dispatch::spawn_process_dispatch;
use crate::state::AppState;

const SOURCE_VERSION: &str = "1.0.0";

pub async fn handle_gateway(State(state): State<AppState>, Json(raw): Json<Value>) -> Response {
    match run(state, raw).await {
        Ok(body) => stage_response(StatusCode::ACCEPTED, body),
        Err(err) => err.into_response(),
    }
}

async fn run(state: AppState, raw: Value) -> Result<Value, PipelineError> {
    let payload = unwrap_envelope(raw)?;

    let client_id = require_str(&payload, "client_id")?;
    let listing_id = require_str(&payload, "listing_id")?;
    let callback_webhook = require_str(&payload, "callback_webhook")?;
    let destination_folder = require_str(&payload, "destination_folder")?;

    let brackets_data: Vec<Vec<FileReference>> = payload
        .get("brackets_data")
        .cloned()
        .ok_or_else(|| PipelineError::Validation("brackets_data is required".to_string()))
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|err| PipelineError::Validation(format!("brackets_data malformed: {err}")))
        })?;
    if brackets_data.is_empty() {
        return Err(PipelineError::Validation(
            "brackets_data must contain at least one bracket".to_string(),
        ));
    }

    let explicit_storage = payload.get("storage_provider").and_then(Value::as_str);
    let explicit_enhancement = payload.get("enhancement_provider").and_then(Value::as_str);
    let bundle = decrypt_credentials(&client_id, &payload, explicit_storage, explicit_enhancement)?;

    let notification_level = VerbosityLevel::parse(payload.get("notification_level").and_then(Value::as_str));
    let filename_prefix = optional_str(&payload, "filename_prefix").map(|raw| sanitize_filename_prefix(&raw));
    let skip_finalize = payload
        .get("skip_finalize")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let job_id = Uuid::new_v4();
    let correlation_id = Uuid::new_v4();
    let total_brackets = brackets_data.len();
    let total_files: usize = brackets_data.iter().map(Vec::len).sum();

    let notifier = WebhookNotifier::new(
        callback_webhook.clone(),
        notification_level,
        job_id,
        listing_id.clone(),
        correlation_id,
        "gateway",
    );
    notifier
        .notify(
            "job_started",
            EventSeverity::Info,
            json!({ "total_brackets": total_brackets, "total_files": total_files }),
        )
        .await;

    let process_payload = json!({
        "job_id": job_id,
        "listing_id": listing_id,
        "correlation_id": correlation_id,
        "callback_webhook": callback_webhook,
        "destination_folder": destination_folder,
        "brackets_data": brackets_data,
        "storage_provider": bundle.storage_provider,
        "storage_credentials": bundle.storage_credentials,
        "enhancement_provider": bundle.enhancement_provider,
        "enhancement_credentials": bundle.enhancement_credentials,
        "notification_level": notification_level,
        "filename_prefix": filename_prefix,
        "skip_finalize": skip_finalize,
    });

    info!(job_id = %job_id, listing_id = %listing_id, total_brackets, "gateway dispatching process stage");
    spawn_process_dispatch(state, process_payload, notifier);

    Ok(json!({
        "status": "dispatched",
        "job_id": job_id,
        "correlation_id": correlation_id,
        "storage_provider": bundle.storage_provider,
        "enhancement_provider": bundle.enhancement_provider,
        "total_brackets": total_brackets,
        "total_files": total_files,
        "received_at": Utc::now().to_rfc3339(),
        "version": SOURCE_VERSION,
    }))
}
