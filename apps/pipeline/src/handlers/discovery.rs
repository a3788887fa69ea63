// [apps/pipeline/src/handlers/discovery.rs]
//! The discovery stage (§6): three sub-modes behind one endpoint — listing
//! a source folder, fetching per-file metadata for one page (with a
//! bounded, retrying worker pool, §5), and grouping aggregated metadata
//! into brackets.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use snapforge_bracketing::{extract_capture_time, group_from_aggregated_json};
use snapforge_credentials::decrypt_storage_only;
use snapforge_models::metadata::is_dji_display_name;
use snapforge_models::FileMetadataRecord;
use snapforge_models::FileReference;
use snapforge_providers::{create_storage_provider, FileKind, RAW_HEADER_BYTES};
use uuid::Uuid;

use crate::envelope::{require_str, stage_response, unwrap_envelope};
use crate::error::PipelineError;
use crate::state::AppState;

const FILES_PER_PAGE: usize = 20;
const MAX_DISCOVERY_FILES: usize = 2000;
const PAGE_WORKER_POOL_SIZE: usize = 3;
const PAGE_WORKER_MAX_ATTEMPTS: u32 = 3;
const PAGE_WORKER_RETRY_DELAY_SECONDS: u64 = 2;

pub async fn handle_discovery(State(_state): State<AppState>, Json(raw): Json<Value>) -> Response {
    match run(raw).await {
        Ok(body) => stage_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

async fn run(raw: Value) -> Result<Value, PipelineError> {
    let payload = unwrap_envelope(raw)?;
    let mode = require_str(&payload, "mode")?;

    match mode.as_str() {
        "discovery" => list_source_folder(&payload).await,
        "process_page" => process_page(&payload).await,
        "make_bracket" => make_bracket(&payload),
        other => Err(PipelineError::Validation(format!("unknown discovery mode {other}"))),
    }
}

async fn list_source_folder(payload: &Value) -> Result<Value, PipelineError> {
    let client_id = require_str(payload, "client_id")?;
    let source_folder = require_str(payload, "source_folder")?;
    let explicit_storage = payload.get("storage_provider").and_then(Value::as_str);

    let (storage_provider_kind, storage_credentials) =
        decrypt_storage_only(&client_id, payload, explicit_storage)?;
    let mut storage = create_storage_provider(storage_provider_kind, storage_credentials)?;
    storage.connect().await?;

    let all_files: Vec<FileReference> = storage
        .list_files(&source_folder, None, true, Some(MAX_DISCOVERY_FILES + 1))
        .await?;

    let file_limit_active = all_files.len() > MAX_DISCOVERY_FILES;
    let all_files: Vec<FileReference> = if file_limit_active {
        all_files.into_iter().take(MAX_DISCOVERY_FILES).collect()
    } else {
        all_files
    };

    let total_files = all_files.len();
    let total_pages = total_files.div_ceil(FILES_PER_PAGE).max(1);

    Ok(json!({
        "total_files": total_files,
        "total_pages": total_pages,
        "files_per_page": FILES_PER_PAGE,
        "session_id": Uuid::new_v4(),
        "all_files": all_files,
        "file_limit_active": file_limit_active,
        "max_files_applied": if file_limit_active { Some(MAX_DISCOVERY_FILES) } else { None },
    }))
}

async fn process_page(payload: &Value) -> Result<Value, PipelineError> {
    let client_id = require_str(payload, "client_id")?;
    let page_number = payload
        .get("page_number")
        .and_then(Value::as_u64)
        .ok_or_else(|| PipelineError::Validation("page_number is required".to_string()))? as usize;
    let all_files: Vec<FileReference> = serde_json::from_value(
        payload
            .get("all_files")
            .cloned()
            .ok_or_else(|| PipelineError::Validation("all_files is required".to_string()))?,
    )
    .map_err(|err| PipelineError::Validation(format!("all_files malformed: {err}")))?;

    let explicit_storage = payload.get("storage_provider").and_then(Value::as_str);
    let (storage_provider_kind, storage_credentials) =
        decrypt_storage_only(&client_id, payload, explicit_storage)?;
    let mut storage = create_storage_provider(storage_provider_kind, storage_credentials)?;
    storage.connect().await?;
    let storage_ref = &*storage;

    let start = page_number * FILES_PER_PAGE;
    let page_files: Vec<&FileReference> = all_files.iter().skip(start).take(FILES_PER_PAGE).collect();

    let metadata: Vec<FileMetadataRecord> = stream::iter(page_files)
        .map(|file_ref| async move { fetch_one_record(storage_ref, file_ref).await })
        .buffer_unordered(PAGE_WORKER_POOL_SIZE)
        .filter_map(|record| async move { record })
        .collect()
        .await;

    Ok(json!({ "metadata": metadata }))
}

async fn fetch_one_record(
    storage: &dyn snapforge_providers::StorageProvider,
    file_ref: &FileReference,
) -> Option<FileMetadataRecord> {
    let kind = FileKind::from_display_name(&file_ref.display_name);

    for attempt in 0..PAGE_WORKER_MAX_ATTEMPTS {
        let header_result = if kind.supports_header_partial_download() {
            storage
                .download_file_partial(&file_ref.logical_id, 0, Some(RAW_HEADER_BYTES - 1))
                .await
        } else {
            storage.download_file(&file_ref.logical_id).await
        };

        match header_result {
            Ok(bytes) => {
                let mut record =
                    FileMetadataRecord::new(file_ref.display_name.clone(), file_ref.logical_id.clone());
                record.date_taken = extract_capture_time(&bytes, &file_ref.display_name);
                record.manufacturer = is_dji_display_name(&file_ref.display_name).then(|| "DJI".to_string());
                return Some(record);
            }
            Err(_) if attempt + 1 < PAGE_WORKER_MAX_ATTEMPTS => {
                tokio::time::sleep(Duration::from_secs(PAGE_WORKER_RETRY_DELAY_SECONDS)).await;
            }
            Err(_) => return None,
        }
    }
    None
}

fn make_bracket(payload: &Value) -> Result<Value, PipelineError> {
    let aggregated_metadata = payload
        .get("aggregated_metadata")
        .ok_or_else(|| PipelineError::Validation("aggregated_metadata is required".to_string()))?;
    let time_delta_seconds = payload.get("time_delta_seconds").and_then(Value::as_f64);

    let brackets = group_from_aggregated_json(aggregated_metadata, time_delta_seconds)
        .map_err(|err| PipelineError::Validation(err.to_string()))?;

    serde_json::to_value(&brackets).map_err(|err| PipelineError::Validation(err.to_string()))
}
