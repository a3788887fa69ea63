// [crates/bracketing/src/group.rs]
use chrono::NaiveDateTime;
use snapforge_models::{FileMetadataRecord, MetadataBracket};
use tracing::debug;

const DEFAULT_TIME_DELTA_SECONDS: f64 = 2.0;
const DJI_OVERRIDE_TIME_DELTA_SECONDS: f64 = 10.0;
const CAPTURE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Groups metadata records into exposure brackets (§4.1).
///
/// Records whose `date_taken` does not parse under the fixed EXIF format
/// are dropped (logged, non-fatal) rather than failing the whole group.
pub fn group(
    records: &[FileMetadataRecord],
    time_delta_seconds: Option<f64>,
) -> Vec<MetadataBracket> {
    let effective_delta = effective_time_delta(records, time_delta_seconds);

    let mut parsed: Vec<(NaiveDateTime, FileMetadataRecord)> = records
        .iter()
        .filter_map(|record| match parse_capture_time(record) {
            Some(ts) => Some((ts, record.clone())),
            None => {
                debug!(name = %record.name, "dropping record with unparseable capture time");
                None
            }
        })
        .collect();

    parsed.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut brackets: Vec<Vec<(NaiveDateTime, FileMetadataRecord)>> = Vec::new();
    for entry in parsed {
        match brackets.last_mut() {
            Some(current) => {
                let (last_ts, _) = current.last().expect("bracket is never empty");
                let gap = (entry.0 - *last_ts).num_milliseconds().abs() as f64 / 1000.0;
                if gap <= effective_delta {
                    current.push(entry);
                } else {
                    brackets.push(vec![entry]);
                }
            }
            None => brackets.push(vec![entry]),
        }
    }

    brackets.sort_by(|a, b| {
        let earliest_a = a.first().expect("bracket is never empty").0;
        let earliest_b = b.first().expect("bracket is never empty").0;
        earliest_a.cmp(&earliest_b)
    });

    brackets
        .into_iter()
        .map(|bracket| bracket.into_iter().map(|(_, record)| record).collect())
        .collect()
}

/// Determines the effective time-delta: a DJI majority overrides any
/// requested value to 10s; otherwise the caller's value, defaulting to 2s.
fn effective_time_delta(records: &[FileMetadataRecord], requested: Option<f64>) -> f64 {
    if records.is_empty() {
        return requested.unwrap_or(DEFAULT_TIME_DELTA_SECONDS);
    }
    let dji_count = records
        .iter()
        .filter(|record| record.is_dji_pattern())
        .count();
    if dji_count * 2 > records.len() {
        DJI_OVERRIDE_TIME_DELTA_SECONDS
    } else {
        requested.unwrap_or(DEFAULT_TIME_DELTA_SECONDS)
    }
}

fn parse_capture_time(record: &FileMetadataRecord) -> Option<NaiveDateTime> {
    let raw = record.date_taken.as_ref()?;
    NaiveDateTime::parse_from_str(raw, CAPTURE_TIME_FORMAT).ok()
}
