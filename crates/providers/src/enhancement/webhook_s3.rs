// [crates/providers/src/enhancement/webhook_s3.rs]
use reqwest::Client;
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use async_trait::async_trait;
use snapforge_models::{EnhancementStatus, UploadHandle};
use tracing::instrument;

use crate::enhancement::{EnhancementOptions, EnhancementProvider};
use crate::error::ProviderError;

const API_BASE: &str = "https://api.webhook-s3.example.com/v2";
const ENHANCEMENT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Backend H: a grouped upload protocol keyed by a client-generated
/// `unique_identifier` per bracket (§4.3). Because the presigned S3 URLs
/// are only known once every file name in the bracket is declared,
/// `upload_image` buffers bytes in-memory and the real network exchange
/// (creation request, per-file PUT, finalize) happens inside
/// `request_enhancement`. Result delivery is webhook-driven: `check_status`
/// always reports `webhook_based` and `get_result_url` always returns
/// `None`.
pub struct WebhookS3Provider {
    client: Client,
    api_key: String,
    account_email: String,
    pending: Mutex<Vec<(String, Vec<u8>)>>,
}

impl WebhookS3Provider {
    pub fn new(api_key: String, account_email: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            account_email,
            pending: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EnhancementProvider for WebhookS3Provider {
    #[instrument(skip(self, bytes))]
    async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<UploadHandle, ProviderError> {
        let mut pending = self.pending.lock().await;
        pending.push((filename.to_string(), bytes));
        Ok(UploadHandle(filename.to_string()))
    }

    async fn request_enhancement(
        &self,
        upload_handles: &[UploadHandle],
        listing_id: &str,
        options: &EnhancementOptions,
    ) -> Result<String, ProviderError> {
        let mut pending = self.pending.lock().await;
        let files: Vec<(String, Vec<u8>)> = pending.drain(..).collect();
        drop(pending);

        if files.is_empty() {
            return Err(ProviderError::Validation(
                "no buffered files to request enhancement for".to_string(),
            ));
        }

        let identifier = Uuid::new_v4().to_string();
        let file_names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();

        let creation_response = self
            .client
            .post(format!("{API_BASE}/photoshoots"))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(ENHANCEMENT_REQUEST_TIMEOUT_SECONDS))
            .json(&json!({
                "account_email": self.account_email,
                "unique_identifier": identifier,
                "file_names": file_names,
                "property_address": options.property_address,
                "twilight": options.twilight,
                "upload_progress_webhook": options.upload_progress_webhook,
                "final_status_webhook": options.final_status_webhook,
                "listing_id": listing_id,
            }))
            .send()
            .await?;
        if !creation_response.status().is_success() {
            return Err(ProviderError::Validation(
                "photoshoot creation rejected".to_string(),
            ));
        }
        let body: serde_json::Value = creation_response.json().await?;
        let upload_urls: Vec<String> = body
            .get("upload_urls")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::Protocol("photoshoot response missing upload_urls".into()))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if upload_urls.len() != files.len() {
            return Err(ProviderError::Protocol(
                "photoshoot response returned a different number of upload urls than files".to_string(),
            ));
        }

        for ((filename, bytes), url) in files.iter().zip(upload_urls.iter()) {
            let mime_type = mime_guess::from_path(filename).first_or_octet_stream();
            let timeout_seconds = crate::file_types::FileKind::from_display_name(filename)
                .upload_timeout_seconds(bytes.len() as u64);
            let put_response = self
                .client
                .put(url)
                .timeout(std::time::Duration::from_secs_f64(timeout_seconds))
                .header("Content-Type", mime_type.as_ref())
                .body(bytes.clone())
                .send()
                .await?;
            if !put_response.status().is_success() {
                return Err(ProviderError::Network(put_response.error_for_status().unwrap_err()));
            }
        }

        let finalize_response = self
            .client
            .post(format!("{API_BASE}/photoshoots/{identifier}/finalize"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "account_email": self.account_email, "unique_identifier": identifier }))
            .send()
            .await?;
        if !finalize_response.status().is_success() {
            return Err(ProviderError::Validation(
                "photoshoot finalize rejected".to_string(),
            ));
        }

        let _ = upload_handles;
        Ok(body
            .get("listing_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(identifier))
    }

    async fn check_status(&self, _ticket_id: &str) -> Result<EnhancementStatus, ProviderError> {
        Ok(EnhancementStatus::WebhookBased)
    }

    async fn get_result_url(&self, _ticket_id: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}
