// [apps/pipeline/src/handlers/process.rs]
//! The process stage (§4.4): downloads every bracket member from storage,
//! uploads survivors to the enhancement provider, and requests one
//! enhancement per bracket. Dispatches finalize synchronously unless the
//! caller asked to skip it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use snapforge_models::{
    EnhancementCredentials, EnhancementProviderKind, EnhancementTicket, FailedBracketEntry,
    FileReference, StorageCredentials, StorageProviderKind,
};
use snapforge_notify::{EventSeverity, VerbosityLevel, WebhookNotifier};
use snapforge_providers::{create_enhancement_provider, create_storage_provider, EnhancementOptions};
use tracing::{info, warn};
use uuid::Uuid;

use crate::envelope::{optional_str, require_str, stage_response, unwrap_envelope};
use crate::error::PipelineError;
use crate::services::dispatch::invoke_finalize;
use crate::state::AppState;

pub async fn handle_process(State(state): State<AppState>, Json(raw): Json<Value>) -> Response {
    match run(state, raw).await {
        Ok(body) => stage_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

async fn run(state: AppState, raw: Value) -> Result<Value, PipelineError> {
    let payload = unwrap_envelope(raw)?;

    let job_id: Uuid = require_str(&payload, "job_id")?
        .parse()
        .map_err(|_| PipelineError::Validation("job_id is not a valid uuid".to_string()))?;
    let listing_id = require_str(&payload, "listing_id")?;
    let correlation_id: Uuid = require_str(&payload, "correlation_id")?
        .parse()
        .map_err(|_| PipelineError::Validation("correlation_id is not a valid uuid".to_string()))?;
    let callback_webhook = require_str(&payload, "callback_webhook")?;
    let destination_folder = require_str(&payload, "destination_folder")?;
    let filename_prefix = optional_str(&payload, "filename_prefix");
    let skip_finalize = payload
        .get("skip_finalize")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let notification_level = VerbosityLevel::parse(payload.get("notification_level").and_then(Value::as_str));

    let brackets_data: Vec<Vec<FileReference>> = serde_json::from_value(
        payload
            .get("brackets_data")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("brackets_data is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("brackets_data malformed: {err}")))?;

    let storage_provider_kind: StorageProviderKind = serde_json::from_value(
        payload
            .get("storage_provider")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("storage_provider is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("storage_provider malformed: {err}")))?;
    let storage_credentials: StorageCredentials = serde_json::from_value(
        payload
            .get("storage_credentials")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("storage_credentials is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("storage_credentials malformed: {err}")))?;
    let enhancement_provider_kind: EnhancementProviderKind = serde_json::from_value(
        payload
            .get("enhancement_provider")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("enhancement_provider is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("enhancement_provider malformed: {err}")))?;
    let enhancement_credentials: EnhancementCredentials = serde_json::from_value(
        payload
            .get("enhancement_credentials")
            .cloned()
            .ok_or_else(|| {
                PipelineError::Validation("enhancement_credentials is required".to_string())
            })?,
    )
    .map_err(|err| PipelineError::Validation(format!("enhancement_credentials malformed: {err}")))?;

    let notifier = WebhookNotifier::new(
        callback_webhook.clone(),
        notification_level,
        job_id,
        listing_id.clone(),
        correlation_id,
        "process",
    );

    let mut storage = create_storage_provider(storage_provider_kind, storage_credentials)?;
    if let Err(err) = storage.connect().await {
        notifier
            .notify(
                "storage_connection_failed",
                EventSeverity::Error,
                json!({ "error": err.to_string() }),
            )
            .await;
        return Err(PipelineError::Provider(err));
    }

    let enhancement = create_enhancement_provider(enhancement_provider_kind, enhancement_credentials)?;
    let options = EnhancementOptions::default();

    let mut tickets: Vec<EnhancementTicket> = Vec::new();
    let mut failed_brackets: Vec<FailedBracketEntry> = Vec::new();

    for (bracket_index, bracket) in brackets_data.iter().enumerate() {
        let mut upload_handles = Vec::new();
        for file_ref in bracket {
            let bytes = match storage.download_file(&file_ref.logical_id).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(file = %file_ref.display_name, error = %err, "bracket member download failed, skipping");
                    continue;
                }
            };

            let kind = snapforge_providers::FileKind::from_display_name(&file_ref.display_name);
            if !kind.is_within_size_limit(bytes.len() as u64) {
                warn!(file = %file_ref.display_name, size = bytes.len(), "file exceeds size limit, dropping");
                continue;
            }

            let content_type = mime_guess::from_path(&file_ref.display_name)
                .first()
                .map(|mime| mime.essence_str().to_string());
            match enhancement
                .upload_image(&file_ref.display_name, bytes, content_type.as_deref())
                .await
            {
                Ok(handle) => upload_handles.push(handle),
                Err(err) => {
                    warn!(file = %file_ref.display_name, error = %err, "upload to enhancement provider failed, skipping");
                }
            }
        }

        if upload_handles.is_empty() {
            failed_brackets.push(FailedBracketEntry {
                bracket_index,
                error: "no bracket member survived download and upload".to_string(),
            });
            continue;
        }

        match enhancement
            .request_enhancement(&upload_handles, &listing_id, &options)
            .await
        {
            Ok(ticket_id) => tickets.push(EnhancementTicket {
                id: ticket_id,
                bracket_index,
            }),
            Err(err) => failed_brackets.push(FailedBracketEntry {
                bracket_index,
                error: err.to_string(),
            }),
        }
    }

    if tickets.is_empty() {
        notifier
            .notify(
                "job_failed",
                EventSeverity::Error,
                json!({ "failed_brackets": failed_brackets }),
            )
            .await;
        return Ok(json!({
            "status": "job_failed",
            "job_id": job_id,
            "listing_id": listing_id,
            "correlation_id": correlation_id,
            "failed_brackets": failed_brackets,
        }));
    }

    notifier
        .notify(
            "enhancement_requested",
            EventSeverity::Info,
            json!({ "ticket_count": tickets.len(), "failed_bracket_count": failed_brackets.len() }),
        )
        .await;

    if skip_finalize {
        return Ok(json!({
            "status": "enhancement_requested",
            "job_id": job_id,
            "listing_id": listing_id,
            "correlation_id": correlation_id,
            "enhancement_ids": tickets,
        }));
    }

    let finalize_payload = json!({
        "job_id": job_id,
        "listing_id": listing_id,
        "correlation_id": correlation_id,
        "callback_webhook": callback_webhook,
        "destination_folder": destination_folder,
        "filename_prefix": filename_prefix,
        "notification_level": notification_level,
        "enhancement_ids": tickets,
        "failed_brackets": failed_brackets,
        "total_brackets": brackets_data.len(),
        "storage_provider": storage_provider_kind,
        "storage_credentials": reread_storage_credentials(&payload)?,
        "enhancement_provider": enhancement_provider_kind,
        "enhancement_credentials": reread_enhancement_credentials(&payload)?,
    });

    info!(job_id = %job_id, ticket_count = tickets.len(), "process invoking finalize");
    if let Err(err) = invoke_finalize(&state, finalize_payload).await {
        notifier
            .notify(
                "dispatch_failed",
                EventSeverity::Error,
                json!({ "target": "finalize", "error": err.to_string() }),
            )
            .await;
    }

    Ok(json!({
        "status": "enhancement_requested",
        "job_id": job_id,
        "listing_id": listing_id,
        "correlation_id": correlation_id,
    }))
}

/// The payload's own `storage_credentials`/`enhancement_credentials` were
/// already deserialized once above for provider construction, which moves
/// them; re-read from the original JSON to forward to finalize unchanged.
fn reread_storage_credentials(payload: &Value) -> Result<StorageCredentials, PipelineError> {
    serde_json::from_value(payload["storage_credentials"].clone())
        .map_err(|err| PipelineError::Validation(format!("storage_credentials malformed: {err}")))
}

fn reread_enhancement_credentials(payload: &Value) -> Result<EnhancementCredentials, PipelineError> {
    serde_json::from_value(payload["enhancement_credentials"].clone())
        .map_err(|err| PipelineError::Validation(format!("enhancement_credentials malformed: {err}")))
}
