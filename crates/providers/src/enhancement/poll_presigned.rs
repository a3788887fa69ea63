// [crates/providers/src/enhancement/poll_presigned.rs]
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use snapforge_models::{EnhancementStatus, UploadHandle};
use tracing::instrument;

use crate::enhancement::{EnhancementOptions, EnhancementProvider};
use crate::error::ProviderError;

const API_BASE: &str = "https://api.poll-presigned.example.com/v1";
const ENHANCEMENT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
const STATUS_CHECK_TIMEOUT_SECONDS: u64 = 30;
const RESULT_DOWNLOAD_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_SHOT_TYPE: &str = "interior";

/// Backend F: three-step presigned-URL upload, single-POST enhancement
/// request, poll-based status (§4.3).
pub struct PollPresignedProvider {
    client: Client,
    api_key: String,
}

impl PollPresignedProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl EnhancementProvider for PollPresignedProvider {
    #[instrument(skip(self, bytes))]
    async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<UploadHandle, ProviderError> {
        let create_response = self
            .client
            .post(format!("{API_BASE}/uploads"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "filename": filename }))
            .send()
            .await?;
        if !create_response.status().is_success() {
            return Err(ProviderError::Validation(format!(
                "upload creation rejected for {filename}"
            )));
        }
        let body: serde_json::Value = create_response.json().await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Protocol("upload creation missing id".into()))?
            .to_string();
        let url = body
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Protocol("upload creation missing url".into()))?
            .to_string();

        let timeout_seconds = crate::file_types::FileKind::from_display_name(filename)
            .upload_timeout_seconds(bytes.len() as u64);
        let put_response = self
            .client
            .put(&url)
            .timeout(std::time::Duration::from_secs_f64(timeout_seconds))
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        if !put_response.status().is_success() {
            return Err(ProviderError::Network(put_response.error_for_status().unwrap_err()));
        }

        Ok(UploadHandle(id))
    }

    async fn request_enhancement(
        &self,
        upload_handles: &[UploadHandle],
        listing_id: &str,
        options: &EnhancementOptions,
    ) -> Result<String, ProviderError> {
        let handles: Vec<&str> = upload_handles.iter().map(UploadHandle::as_str).collect();
        let shot_type = options.shot_type.as_deref().unwrap_or(DEFAULT_SHOT_TYPE);
        let response = self
            .client
            .post(format!("{API_BASE}/enhancements"))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(ENHANCEMENT_REQUEST_TIMEOUT_SECONDS))
            .json(&json!({
                "upload_ids": handles,
                "listing_id": listing_id,
                "shot_type": shot_type,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Validation(
                "enhancement request rejected".to_string(),
            ));
        }
        let body: serde_json::Value = response.json().await?;
        body.get("ticket_id")
            .or_else(|| body.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Protocol("enhancement response missing ticket id".into()))
    }

    async fn check_status(&self, ticket_id: &str) -> Result<EnhancementStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{API_BASE}/enhancements/status"))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(STATUS_CHECK_TIMEOUT_SECONDS))
            .query(&[("id", ticket_id)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Network(response.error_for_status().unwrap_err()));
        }
        let body: serde_json::Value = response.json().await?;
        let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("unknown");
        Ok(match status {
            "pending" => EnhancementStatus::Pending,
            "in_progress" | "processing" => EnhancementStatus::InProgress,
            "completed" => EnhancementStatus::Completed {
                result_url: body
                    .get("enhanced_image_url")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                expires_at: body.get("expires_at").and_then(|v| v.as_str()).map(str::to_string),
            },
            "failed" => EnhancementStatus::Failed {
                error: body
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("enhancement failed")
                    .to_string(),
            },
            _ => EnhancementStatus::Unknown,
        })
    }
}

/// Referenced by finalize when downloading a completed result (§4.4).
/// Not part of the trait: result download uses a bare GET, not an
/// authenticated provider call, because `result_url` is presigned.
pub async fn download_result(client: &Client, result_url: &str) -> Result<Vec<u8>, ProviderError> {
    let response = client
        .get(result_url)
        .timeout(std::time::Duration::from_secs(RESULT_DOWNLOAD_TIMEOUT_SECONDS))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(ProviderError::Network(response.error_for_status().unwrap_err()));
    }
    Ok(response.bytes().await?.to_vec())
}
