// [crates/models/src/file.rs]
use serde::{Deserialize, Serialize};

/// A reference to a single source or destination file living in a storage
/// backend. `logical_id` is opaque and backend-native: a normalized path
/// string for path-addressed storage, or a native file id for id-addressed
/// storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Backend-native identifier (path or id). Never empty.
    pub logical_id: String,
    /// Human-readable file name, used for content-type sniffing and
    /// destination naming.
    pub display_name: String,
    /// Size in bytes, when known at listing time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl FileReference {
    pub fn new(logical_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            display_name: display_name.into(),
            size_bytes: None,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}
