// [crates/providers/src/file_types.rs]

/// The file-kind taxonomy used for size limits, upload timeouts, and the
/// RAW-header partial-download special case (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Jpeg,
    Png,
    Tiff,
    /// Traditional RAW formats whose metadata lives at the head of the
    /// file; safe to fetch only the first `RAW_HEADER_BYTES`.
    Raw,
    /// Canon's CR3 stores metadata in an MP4-style container and must be
    /// downloaded whole.
    Cr3,
    Other,
}

/// Bytes fetched by a partial header download during discovery (§4.2).
pub const RAW_HEADER_BYTES: u64 = 64 * 1024;

const BASE_UPLOAD_TIMEOUT_SECONDS: f64 = 120.0;
const MAX_UPLOAD_TIMEOUT_SECONDS: f64 = 900.0;
const LARGE_FILE_THRESHOLD_MIB: f64 = 50.0;

impl FileKind {
    /// Classifies by lowercase extension (without the leading dot).
    pub fn from_display_name(display_name: &str) -> Self {
        let ext = display_name
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => FileKind::Jpeg,
            "png" => FileKind::Png,
            "tiff" | "tif" => FileKind::Tiff,
            "cr3" => FileKind::Cr3,
            "dng" | "raw" | "cr2" | "nef" | "arw" | "orf" | "rw2" => FileKind::Raw,
            "heic" | "webp" | "bmp" | "gif" => FileKind::Other,
            _ => FileKind::Other,
        }
    }

    /// True when the extension falls in the traditional-RAW set that
    /// supports header-only partial downloads (excludes `.cr3`).
    pub fn supports_header_partial_download(&self) -> bool {
        matches!(self, FileKind::Raw)
    }

    /// Per-type maximum upload size in MiB (§4.3).
    pub fn max_size_mib(&self) -> u64 {
        match self {
            FileKind::Jpeg => 50,
            FileKind::Png => 100,
            FileKind::Other => 75,
            FileKind::Tiff => 300,
            FileKind::Raw => 250,
            FileKind::Cr3 => 250,
        }
    }

    fn timeout_multiplier(&self) -> f64 {
        match self {
            FileKind::Jpeg => 1.0,
            FileKind::Png => 1.5,
            FileKind::Other => 1.2,
            FileKind::Tiff => 2.5,
            FileKind::Raw | FileKind::Cr3 => 3.0,
        }
    }

    /// Per-file PUT timeout derived from the type's multiplier, scaled up
    /// for files over 50 MiB, capped at 900s (§4.3).
    pub fn upload_timeout_seconds(&self, size_bytes: u64) -> f64 {
        let size_mib = size_bytes as f64 / (1024.0 * 1024.0);
        let mut timeout = BASE_UPLOAD_TIMEOUT_SECONDS * self.timeout_multiplier();
        if size_mib > LARGE_FILE_THRESHOLD_MIB {
            timeout *= size_mib / LARGE_FILE_THRESHOLD_MIB;
        }
        timeout.min(MAX_UPLOAD_TIMEOUT_SECONDS)
    }

    /// True when `size_bytes` is within this type's maximum (§4.3,
    /// boundary: exactly the max is accepted, one byte over is rejected).
    pub fn is_within_size_limit(&self, size_bytes: u64) -> bool {
        size_bytes <= self.max_size_mib() * 1024 * 1024
    }
}
