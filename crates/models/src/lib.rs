// [crates/models/src/lib.rs]
//! Domain and wire DTOs shared by every stage of the enhancement pipeline.
//!
//! Nothing in this crate talks to the network or the filesystem: it exists
//! so that `snapforge-bracketing`, `snapforge-providers`, `snapforge-notify`,
//! and the `snapforge-pipeline` app agree on one shape for each entity in
//! the data model (source files, brackets, enhancement tickets, jobs,
//! credential bundles, job results).

pub mod credentials;
pub mod enhancement;
pub mod file;
pub mod job;
pub mod metadata;
pub mod result;

pub use credentials::{CredentialBundle, EnhancementCredentials, StorageCredentials};
pub use enhancement::{EnhancementStatus, EnhancementTicket, UploadHandle};
pub use file::FileReference;
pub use job::{BracketOutcome, Job};
pub use metadata::FileMetadataRecord;
pub use result::{EnhancedImageEntry, FailedBracketEntry, JobResult, JobStatus};

/// A bracket of source files as carried between discovery and process: an
/// ordered, non-empty group of files captured within one exposure window.
pub type FileBracket = Vec<FileReference>;

/// A bracket of metadata records, as produced by the bracketing engine
/// before storage identifiers are re-attached.
pub type MetadataBracket = Vec<FileMetadataRecord>;

/// Selects which storage backend family a credential bundle speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProviderKind {
    /// Backend A: path-addressed storage (team namespaces, chunked uploads).
    PathAddressed,
    /// Backend B: id-addressed storage (OAuth2, MIME-type listing).
    IdAddressed,
}

/// Selects which enhancement backend family a credential bundle speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementProviderKind {
    /// Backend F: poll-based, presigned-URL upload.
    PollPresigned,
    /// Backend H: presigned-S3 upload with webhook-driven result delivery.
    WebhookS3,
}
