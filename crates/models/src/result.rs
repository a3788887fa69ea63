// [crates/models/src/result.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::{BracketOutcome, Job};

/// The lifecycle state of a job, carried as the literal `status` string in
/// every finalize callback (§6). Variants map 1:1 onto the wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    JobStarted,
    EnhancementRequested,
    JobCompleted,
    JobPartialSuccess,
    JobFailed,
}

/// One successfully enhanced bracket, as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedImageEntry {
    pub bracket_index: usize,
    pub storage_path: String,
    pub file_size_mb: f64,
}

/// One bracket that failed enhancement after exhausting retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBracketEntry {
    pub bracket_index: usize,
    pub error: String,
}

/// The finalize-stage callback payload (§6): the full accounting of a job,
/// sent once the job reaches a terminal or milestone status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    pub job_id: Uuid,
    pub listing_id: String,
    pub total_brackets: usize,
    pub processed_brackets: usize,
    pub successful_enhancements: usize,
    pub failed_enhancements: usize,
    pub enhanced_images: Vec<EnhancedImageEntry>,
    pub failed_brackets: Vec<FailedBracketEntry>,
    pub retry_attempts: u32,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub version: String,
    pub correlation_id: Uuid,
}

impl JobResult {
    /// Builds the callback payload from a job's accumulated outcomes.
    /// `source` and `version` identify the emitting stage, per §6.
    pub fn from_job(
        job: &Job,
        status: JobStatus,
        retry_attempts: u32,
        source: impl Into<String>,
        version: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut enhanced_images = Vec::new();
        let mut failed_brackets = Vec::new();
        for outcome in &job.outcomes {
            match outcome {
                BracketOutcome::Enhanced {
                    bracket_index,
                    storage_path,
                    file_size_mb,
                } => enhanced_images.push(EnhancedImageEntry {
                    bracket_index: *bracket_index,
                    storage_path: storage_path.clone(),
                    file_size_mb: *file_size_mb,
                }),
                BracketOutcome::Failed {
                    bracket_index,
                    error,
                } => failed_brackets.push(FailedBracketEntry {
                    bracket_index: *bracket_index,
                    error: error.clone(),
                }),
            }
        }

        Self {
            status,
            job_id: job.job_id,
            listing_id: job.listing_id.clone(),
            total_brackets: job.total_brackets,
            processed_brackets: job.processed_brackets,
            successful_enhancements: enhanced_images.len(),
            failed_enhancements: failed_brackets.len(),
            enhanced_images,
            failed_brackets,
            retry_attempts,
            timestamp,
            source: source.into(),
            version: version.into(),
            correlation_id: job.correlation_id,
        }
    }
}
