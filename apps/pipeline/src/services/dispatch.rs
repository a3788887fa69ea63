// [apps/pipeline/src/services/dispatch.rs]
//! Inter-stage HTTP dispatch (§5): the gateway hands the process stage to
//! a detached background task so it can acknowledge within ~1s; the
//! process stage invokes finalize synchronously and awaits it, since
//! finalize's own retry loop can run for several minutes.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use snapforge_notify::{EventSeverity, WebhookNotifier};
use tracing::{error, info};

use crate::error::PipelineError;
use crate::state::AppState;

const INTER_STAGE_DISPATCH_TIMEOUT_SECONDS: u64 = 60;
/// Generous enough to cover finalize's worst case: `retry_delay_seconds
/// (180) * (max_retries + 1) (4)` plus per-pass work (§5).
const FINALIZE_INVOCATION_TIMEOUT_SECONDS: u64 = 810;

/// Fires the process-stage dispatch on a detached task. Dispatch failures
/// are reported via the `dispatch_failed` webhook event and logged; they
/// never propagate back to the gateway's own response, which has already
/// been sent.
pub fn spawn_process_dispatch(state: AppState, payload: Value, notifier: WebhookNotifier) {
    tokio::spawn(async move {
        let url = state.process_function_url.clone();
        match post_stage(&state.dispatch_client, &url, payload, INTER_STAGE_DISPATCH_TIMEOUT_SECONDS).await
        {
            Ok(_) => info!(url = %url, "process stage dispatched"),
            Err(err) => {
                error!(url = %url, error = %err, "process stage dispatch failed");
                notifier
                    .notify(
                        "dispatch_failed",
                        EventSeverity::Error,
                        serde_json::json!({ "target": "process", "error": err.to_string() }),
                    )
                    .await;
            }
        }
    });
}

/// Invokes the finalize stage synchronously from the process stage and
/// awaits its completion. Errors are returned to the caller, which reports
/// them as a dispatch failure without rolling back process's own work.
pub async fn invoke_finalize(state: &AppState, payload: Value) -> Result<Value, PipelineError> {
    post_stage(
        &state.dispatch_client,
        &state.finalize_function_url,
        payload,
        FINALIZE_INVOCATION_TIMEOUT_SECONDS,
    )
    .await
    .map_err(|err| PipelineError::Dispatch("finalize".to_string(), err.to_string()))
}

async fn post_stage(
    client: &Client,
    url: &str,
    payload: Value,
    timeout_seconds: u64,
) -> Result<Value, reqwest::Error> {
    let response = client
        .post(url)
        .timeout(Duration::from_secs(timeout_seconds))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;
    response.json::<Value>().await
}
