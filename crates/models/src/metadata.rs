// [crates/models/src/metadata.rs]
use serde::{Deserialize, Serialize};

/// A file metadata record as produced by discovery's page-processing
/// sub-mode, consumed by the bracketing engine.
///
/// `capture_timestamp` is kept in the raw `YYYY:MM:DD HH:MM:SS` form EXIF
/// tags use rather than a parsed `DateTime`: the format is fixed-width, so
/// lexicographic ordering already matches chronological ordering, and
/// carrying it as a string lets a record with an unparseable or missing
/// timestamp survive the wire hop instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadataRecord {
    pub name: String,
    pub path_lower: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl FileMetadataRecord {
    pub fn new(name: impl Into<String>, path_lower: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_lower: path_lower.into(),
            date_taken: None,
            manufacturer: None,
        }
    }

    /// True when the display name matches the DJI naming pattern
    /// (`DJI_...dng`, case-insensitive) used to detect drone RAW captures.
    pub fn is_dji_pattern(&self) -> bool {
        is_dji_display_name(&self.name)
    }
}

/// `DJI_...` prefix, `.dng` suffix, case-insensitive. DJI drones tag their
/// RAW captures this way and frequently omit `DateTimeOriginal`, so the
/// bracketing engine treats this pattern specially in two places: time-delta
/// override (§4.1) and EXIF tag preference (§4.1 `extract_capture_time`).
pub fn is_dji_display_name(display_name: &str) -> bool {
    let lower = display_name.to_ascii_lowercase();
    lower.starts_with("dji_") && lower.ends_with(".dng")
}
