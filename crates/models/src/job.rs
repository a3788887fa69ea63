// [crates/models/src/job.rs]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tracks one listing's pass through the pipeline across the gateway and
/// process stages (§3). `processed_brackets` only ever grows; `outcomes`
/// is append-only and indexed by bracket order, not bracket index, so a
/// retried bracket appends a new entry rather than overwriting the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub listing_id: String,
    pub correlation_id: Uuid,
    pub total_brackets: usize,
    pub processed_brackets: usize,
    pub outcomes: Vec<BracketOutcome>,
}

impl Job {
    pub fn new(listing_id: impl Into<String>, correlation_id: Uuid, total_brackets: usize) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            listing_id: listing_id.into(),
            correlation_id,
            total_brackets,
            processed_brackets: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: BracketOutcome) {
        self.processed_brackets += 1;
        self.outcomes.push(outcome);
    }

    pub fn is_complete(&self) -> bool {
        self.processed_brackets >= self.total_brackets
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// The terminal result of processing a single bracket, one entry per
/// bracket in `Job::outcomes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BracketOutcome {
    Enhanced {
        bracket_index: usize,
        storage_path: String,
        file_size_mb: f64,
    },
    Failed {
        bracket_index: usize,
        error: String,
    },
}

impl BracketOutcome {
    pub fn bracket_index(&self) -> usize {
        match self {
            BracketOutcome::Enhanced { bracket_index, .. } => *bracket_index,
            BracketOutcome::Failed { bracket_index, .. } => *bracket_index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BracketOutcome::Enhanced { .. })
    }
}
