// [crates/bracketing/src/aggregate.rs]
use serde_json::Value;
use snapforge_models::{FileMetadataRecord, MetadataBracket};

use crate::error::BracketingError;
use crate::group::group;

/// Parses discovery's aggregated metadata payload and emits the bracket
/// grouping directly (the `make_bracket` discovery sub-mode, §6).
///
/// Tolerates one level of nesting (`[[record], [record]]` as well as
/// `[record, record]`), flattening before validation. A missing
/// `date_taken` on the first record is a fatal format error; the same
/// condition on later records is handled by `group`'s non-fatal drop.
pub fn group_from_aggregated_json(
    aggregated_metadata: &Value,
    time_delta_seconds: Option<f64>,
) -> Result<Vec<MetadataBracket>, BracketingError> {
    let raw_entries = aggregated_metadata
        .as_array()
        .ok_or(BracketingError::NotAnArray)?;

    if raw_entries.is_empty() {
        return Err(BracketingError::EmptyInput);
    }

    let flattened = flatten_one_level(raw_entries);
    if flattened.is_empty() {
        return Err(BracketingError::EmptyInput);
    }

    let first_has_capture_time = flattened[0]
        .get("date_taken")
        .map(|v| !v.is_null())
        .unwrap_or(false);
    if !first_has_capture_time {
        return Err(BracketingError::MissingCaptureTimeOnFirstRecord);
    }

    let records = flattened
        .into_iter()
        .map(|entry| serde_json::from_value::<FileMetadataRecord>(entry.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(group(&records, time_delta_seconds))
}

fn flatten_one_level(entries: &[Value]) -> Vec<Value> {
    let mut flattened = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.as_array() {
            Some(nested) => flattened.extend(nested.iter().cloned()),
            None => flattened.push(entry.clone()),
        }
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_one_level_of_nesting() {
        let aggregated = json!([
            [{"name": "a.jpg", "path_lower": "/a.jpg", "date_taken": "2024:01:01 10:00:00"}],
            [{"name": "b.jpg", "path_lower": "/b.jpg", "date_taken": "2024:01:01 10:00:01"}],
        ]);
        let brackets = group_from_aggregated_json(&aggregated, Some(2.0)).unwrap();
        assert_eq!(brackets.len(), 1);
        assert_eq!(brackets[0].len(), 2);
    }

    #[test]
    fn missing_capture_time_on_first_record_is_fatal() {
        let aggregated = json!([
            {"name": "a.jpg", "path_lower": "/a.jpg"},
            {"name": "b.jpg", "path_lower": "/b.jpg", "date_taken": "2024:01:01 10:00:01"},
        ]);
        let err = group_from_aggregated_json(&aggregated, Some(2.0)).unwrap_err();
        assert!(matches!(
            err,
            BracketingError::MissingCaptureTimeOnFirstRecord
        ));
    }

    #[test]
    fn rejects_non_array_input() {
        let aggregated = json!({"not": "an array"});
        let err = group_from_aggregated_json(&aggregated, None).unwrap_err();
        assert!(matches!(err, BracketingError::NotAnArray));
    }
}
