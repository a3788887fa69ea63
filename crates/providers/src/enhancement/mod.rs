// [crates/providers/src/enhancement/mod.rs]
pub mod poll_presigned;
pub mod webhook_s3;

use async_trait::async_trait;
use snapforge_models::{EnhancementCredentials, EnhancementProviderKind, EnhancementStatus, UploadHandle};

use crate::error::ProviderError;

/// Options accompanying an enhancement request.
#[derive(Debug, Clone, Default)]
pub struct EnhancementOptions {
    /// Backend F's `shot_type`, defaulting to `interior` (§4.3).
    pub shot_type: Option<String>,
    /// Backend H's property address, twilight flag, and webhook URLs.
    pub property_address: Option<String>,
    pub twilight: bool,
    pub upload_progress_webhook: Option<String>,
    pub final_status_webhook: Option<String>,
}

/// The uniform contract both enhancement backend families implement
/// (§4.3).
#[async_trait]
pub trait EnhancementProvider: Send + Sync {
    /// Always true after construction: neither backend has a real
    /// connection step beyond holding its API key (§9 Open Questions).
    fn is_connected(&self) -> bool {
        true
    }

    async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadHandle, ProviderError>;

    /// Returns the provider-native ticket id; the caller (the process
    /// stage) is responsible for associating it with a bracket index.
    async fn request_enhancement(
        &self,
        upload_handles: &[UploadHandle],
        listing_id: &str,
        options: &EnhancementOptions,
    ) -> Result<String, ProviderError>;

    async fn check_status(&self, ticket_id: &str) -> Result<EnhancementStatus, ProviderError>;

    /// Default: derived from the observed status.
    async fn get_result_url(&self, ticket_id: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.check_status(ticket_id).await?.result_url().map(str::to_string))
    }
}

/// Instantiates the enhancement backend a credential bundle selects.
pub fn create_enhancement_provider(
    kind: EnhancementProviderKind,
    credentials: EnhancementCredentials,
) -> Result<Box<dyn EnhancementProvider>, ProviderError> {
    match (kind, credentials) {
        (
            EnhancementProviderKind::PollPresigned,
            EnhancementCredentials::PollPresigned { api_key },
        ) => Ok(Box::new(poll_presigned::PollPresignedProvider::new(api_key))),
        (
            EnhancementProviderKind::WebhookS3,
            EnhancementCredentials::WebhookS3 { api_key, email },
        ) => Ok(Box::new(webhook_s3::WebhookS3Provider::new(api_key, email))),
        _ => Err(ProviderError::Validation(
            "enhancement provider selector does not match the supplied credential shape".to_string(),
        )),
    }
}
