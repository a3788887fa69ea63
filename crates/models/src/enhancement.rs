// [crates/models/src/enhancement.rs]
use serde::{Deserialize, Serialize};

/// Opaque identifier returned by an enhancement provider after a single
/// file is ingested; consumed when submitting the enhancement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHandle(pub String);

impl UploadHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier for one bracket's enhancement job, associated with the
/// bracket it was produced from so finalize can place the result correctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementTicket {
    pub id: String,
    pub bracket_index: usize,
}

/// Observed state of an enhancement job, as reported by `check_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnhancementStatus {
    Pending,
    InProgress,
    Completed {
        result_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<String>,
    },
    Failed {
        error: String,
    },
    /// Backend H never reports a real status synchronously: delivery is
    /// webhook-driven. `get_result_url` always returns `None` for this
    /// variant.
    WebhookBased,
    Unknown,
}

impl EnhancementStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnhancementStatus::Completed { .. } | EnhancementStatus::Failed { .. }
        )
    }

    pub fn result_url(&self) -> Option<&str> {
        match self {
            EnhancementStatus::Completed { result_url, .. } => Some(result_url),
            _ => None,
        }
    }
}
