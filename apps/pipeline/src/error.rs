// [apps/pipeline/src/error.rs]
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use snapforge_credentials::CredentialError;
use snapforge_providers::ProviderError;
use thiserror::Error;

use crate::envelope::stage_response;

/// Errors surfaced by a stage handler, taxonomised the way §7 groups them:
/// validation and authentication fail the invocation synchronously;
/// dispatch failures are reported but never roll back prior work.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("credential envelope error: {0}")]
    Credential(#[from] CredentialError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("dispatch to {0} failed: {1}")]
    Dispatch(String, String),
}

impl PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::Credential(CredentialError::MissingTenantKey(_))
            | PipelineError::Credential(CredentialError::InvalidKeyEncoding(_))
            | PipelineError::Credential(CredentialError::DecryptionFailed(_)) => {
                StatusCode::UNAUTHORIZED
            }
            PipelineError::Credential(_) => StatusCode::BAD_REQUEST,
            PipelineError::Provider(ProviderError::Auth(_))
            | PipelineError::Provider(ProviderError::Permission(_)) => StatusCode::UNAUTHORIZED,
            PipelineError::Provider(ProviderError::Validation(_)) => StatusCode::BAD_REQUEST,
            PipelineError::Provider(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Dispatch(_, _) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(error = %self, status = %status, "stage invocation failed");
        stage_response(status, json!({ "error": self.to_string() }))
    }
}
