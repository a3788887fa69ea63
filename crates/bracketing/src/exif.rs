// [crates/bracketing/src/exif.rs]
use std::io::Cursor;

use exif::{In, Reader, Tag};
use snapforge_models::metadata::is_dji_display_name;
use tracing::debug;

/// Reads the capture timestamp out of embedded photo metadata (§4.1).
///
/// DJI captures frequently omit `DateTimeOriginal`, so for files matching
/// the DJI naming pattern the generic `DateTime` tag is preferred; for
/// everything else `DateTimeOriginal` is preferred, falling back to
/// `DateTime` if the file lacks it. Returns the raw `YYYY:MM:DD HH:MM:SS`
/// string unparsed; `group` is responsible for parsing it.
pub fn extract_capture_time(file_bytes: &[u8], display_name: &str) -> Option<String> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(file_bytes)) {
        Ok(exif) => exif,
        Err(err) => {
            debug!(name = display_name, error = %err, "failed to read EXIF container");
            return None;
        }
    };

    let (primary, fallback) = if is_dji_display_name(display_name) {
        (Tag::DateTime, Tag::DateTimeOriginal)
    } else {
        (Tag::DateTimeOriginal, Tag::DateTime)
    };

    read_datetime_tag(&exif, primary).or_else(|| read_datetime_tag(&exif, fallback))
}

fn read_datetime_tag(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .map(|field| field.display_value().to_string())
}
