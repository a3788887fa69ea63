// [crates/bracketing/src/error.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BracketingError {
    #[error("aggregated metadata is empty")]
    EmptyInput,

    #[error("first record is missing a capture timestamp field")]
    MissingCaptureTimeOnFirstRecord,

    #[error("aggregated metadata is not a JSON array")]
    NotAnArray,

    #[error("failed to parse metadata record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
}
