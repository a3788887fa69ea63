// [apps/pipeline/src/handlers/finalize.rs]
//! The finalize stage (§4.4): polls every enhancement ticket up to
//! `max_retries + 1` passes, uploads completed results to the destination
//! folder, and emits one aggregated job-result callback.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use snapforge_models::{
    BracketOutcome, EnhancedImageEntry, EnhancementCredentials, EnhancementProviderKind,
    EnhancementStatus, EnhancementTicket, FailedBracketEntry, Job, JobResult, JobStatus,
    StorageCredentials, StorageProviderKind,
};
use snapforge_notify::{EventSeverity, VerbosityLevel, WebhookNotifier};
use snapforge_providers::{create_enhancement_provider, create_storage_provider, normalize_path};
use tracing::{info, warn};
use uuid::Uuid;

use crate::envelope::{optional_str, require_str, sanitize_filename_prefix, stage_response, unwrap_envelope};
use crate::error::PipelineError;
use crate::state::AppState;

const SOURCE_VERSION: &str = "1.0.0";
/// §4.4: "Finalize retries are bounded to 3 extra passes" — 4 total.
const MAX_RETRY_PASSES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 180;
const RESULT_DOWNLOAD_TIMEOUT_SECONDS: u64 = 300;

pub async fn handle_finalize(State(_state): State<AppState>, Json(raw): Json<Value>) -> Response {
    match run(raw).await {
        Ok(body) => stage_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

async fn run(raw: Value) -> Result<Value, PipelineError> {
    let payload = unwrap_envelope(raw)?;

    let job_id: Uuid = optional_str(&payload, "job_id")
        .map(|raw| raw.parse())
        .transpose()
        .map_err(|_| PipelineError::Validation("job_id is not a valid uuid".to_string()))?
        .unwrap_or_else(Uuid::new_v4);
    let listing_id = require_str(&payload, "listing_id")?;
    let correlation_id: Uuid = optional_str(&payload, "correlation_id")
        .map(|raw| raw.parse())
        .transpose()
        .map_err(|_| PipelineError::Validation("correlation_id is not a valid uuid".to_string()))?
        .unwrap_or_else(Uuid::new_v4);
    let callback_webhook = require_str(&payload, "callback_webhook")?;
    let destination_folder = require_str(&payload, "destination_folder")?;
    let filename_prefix = optional_str(&payload, "filename_prefix");
    let notification_level = VerbosityLevel::parse(payload.get("notification_level").and_then(Value::as_str));

    let mut pending: Vec<EnhancementTicket> = serde_json::from_value(
        payload
            .get("enhancement_ids")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("enhancement_ids is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("enhancement_ids malformed: {err}")))?;

    let mut failed: Vec<FailedBracketEntry> = payload
        .get("failed_brackets")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err: serde_json::Error| {
            PipelineError::Validation(format!("failed_brackets malformed: {err}"))
        })?
        .unwrap_or_default();

    let total_brackets = payload
        .get("total_brackets")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(pending.len() + failed.len());

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
        "finalize",
    );
    notifier
        .notify("finalize_entered", EventSeverity::Info, serde_json::json!({ "ticket_count": pending.len() }))
        .await;

    let mut storage = create_storage_provider(storage_provider_kind, storage_credentials)?;
    storage.connect().await?;
    let enhancement = create_enhancement_provider(enhancement_provider_kind, enhancement_credentials)?;

    let prefix = filename_prefix
        .as_deref()
        .map(sanitize_filename_prefix)
        .filter(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| sanitize_filename_prefix(&listing_id));

    let download_client = Client::new();
    let mut job = Job {
        job_id,
        listing_id: listing_id.clone(),
        correlation_id,
        total_brackets,
        processed_brackets: 0,
        outcomes: Vec::new(),
    };
    for entry in failed.drain(..) {
        job.record(BracketOutcome::Failed {
            bracket_index: entry.bracket_index,
            error: entry.error,
        });
    }
    let mut retry_attempts: u32 = 0;

    for pass in 0..=MAX_RETRY_PASSES {
        if pending.is_empty() {
            break;
        }
        retry_attempts = pass + 1;

        let mut still_pending = Vec::new();
        for ticket in pending.drain(..) {
            match enhancement.check_status(&ticket.id).await {
                Ok(EnhancementStatus::Completed { result_url, .. }) => {
                    match download_and_store(
                        &download_client,
                        &mut *storage,
                        storage_provider_kind,
                        &result_url,
                        &destination_folder,
                        &prefix,
                        ticket.bracket_index,
                    )
                    .await
                    {
                        Ok(entry) => job.record(BracketOutcome::Enhanced {
                            bracket_index: entry.bracket_index,
                            storage_path: entry.storage_path,
                            file_size_mb: entry.file_size_mb,
                        }),
                        Err(err) => job.record(BracketOutcome::Failed {
                            bracket_index: ticket.bracket_index,
                            error: err.to_string(),
                        }),
                    }
                }
                Ok(EnhancementStatus::Failed { error }) => {
                    job.record(BracketOutcome::Failed {
                        bracket_index: ticket.bracket_index,
                        error,
                    });
                }
                Ok(_) => still_pending.push(ticket),
                Err(err) => {
                    warn!(ticket = %ticket.id, error = %err, "status check failed, will retry");
                    still_pending.push(ticket);
                }
            }
        }
        pending = still_pending;

        if !pending.is_empty() && pass < MAX_RETRY_PASSES {
            tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
        }
    }

    for ticket in pending {
        job.record(BracketOutcome::Failed {
            bracket_index: ticket.bracket_index,
            error: "timed out waiting for enhancement completion".to_string(),
        });
    }

    let status = if job.successful() == 0 {
        JobStatus::JobFailed
    } else if job.failed() == 0 {
        JobStatus::JobCompleted
    } else {
        JobStatus::JobPartialSuccess
    };

    let result = JobResult::from_job(&job, status, retry_attempts, "finalize", SOURCE_VERSION, Utc::now());

    let event_name = match result.status {
        JobStatus::JobCompleted => "job_completed",
        JobStatus::JobPartialSuccess => "job_partial_success",
        JobStatus::JobFailed => "job_failed",
        _ => "job_completed",
    };
    let severity = if matches!(result.status, JobStatus::JobFailed) {
        EventSeverity::Error
    } else {
        EventSeverity::Info
    };
    notifier.notify(event_name, severity, serde_json::json!({})).await;
    notifier.send_job_result(&result).await;

    info!(job_id = %job_id, status = ?result.status, "finalize complete");
    serde_json::to_value(&result).map_err(|err| PipelineError::Validation(err.to_string()))
}

#[allow(clippy::too_many_arguments)]
async fn download_and_store(
    download_client: &Client,
    storage: &mut dyn snapforge_providers::StorageProvider,
    storage_provider_kind: StorageProviderKind,
    result_url: &str,
    destination_folder: &str,
    prefix: &str,
    bracket_index: usize,
) -> Result<EnhancedImageEntry, PipelineError> {
    let bytes = download_result(download_client, result_url).await?;
    let filename = format!("{}_{}.jpg", bracket_index + 1, prefix);
    let joined = format!("{}/{}", destination_folder.trim_end_matches('/'), filename);
    let destination = match storage_provider_kind {
        StorageProviderKind::PathAddressed => normalize_path(&joined),
        StorageProviderKind::IdAddressed => joined,
    };

    let file_size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
    storage.upload_file(&destination, bytes, true).await.map_err(PipelineError::Provider)?;

    Ok(EnhancedImageEntry {
        bracket_index,
        storage_path: destination,
        file_size_mb,
    })
}

async fn download_result(client: &Client, result_url: &str) -> Result<Vec<u8>, PipelineError> {
    let response = client
        .get(result_url)
        .timeout(Duration::from_secs(RESULT_DOWNLOAD_TIMEOUT_SECONDS))
        .send()
        .await
        .map_err(snapforge_providers::ProviderError::from)?
        .error_for_status()
        .map_err(snapforge_providers::ProviderError::from)?;
    let bytes = response.bytes().await.map_err(snapforge_providers::ProviderError::from)?;
    Ok(bytes.to_vec())
}
