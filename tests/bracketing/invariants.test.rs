// [tests/bracketing/invariants.test.rs]
use proptest::prelude::*;
use snapforge_models::FileMetadataRecord;

fn record_at(index: usize, offset_seconds: i64) -> FileMetadataRecord {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let ts = base + chrono::Duration::seconds(offset_seconds);
    let mut rec = FileMetadataRecord::new(format!("shot_{index}.jpg"), format!("/shots/{index}"));
    rec.date_taken = Some(ts.format("%Y:%m:%d %H:%M:%S").to_string());
    rec
}

proptest! {
    #[test]
    fn every_bracket_is_non_empty_and_sizes_sum_to_input(
        offsets in prop::collection::vec(0i64..500, 1..40)
    ) {
        let records: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| record_at(i, *offset))
            .collect();
        let brackets = snapforge_bracketing::group(&records, Some(2.0));

        let total: usize = brackets.iter().map(Vec::len).sum();
        prop_assert_eq!(total, records.len());
        for bracket in &brackets {
            prop_assert!(!bracket.is_empty());
        }
    }

    #[test]
    fn consecutive_gaps_within_bracket_never_exceed_delta(
        offsets in prop::collection::vec(0i64..500, 2..40)
    ) {
        let records: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| record_at(i, *offset))
            .collect();
        let delta = 2.0;
        let brackets = snapforge_bracketing::group(&records, Some(delta));

        for bracket in &brackets {
            let mut timestamps: Vec<_> = bracket
                .iter()
                .map(|r| {
                    chrono::NaiveDateTime::parse_from_str(
                        r.date_taken.as_ref().unwrap(),
                        "%Y:%m:%d %H:%M:%S",
                    )
                    .unwrap()
                })
                .collect();
            timestamps.sort();
            for pair in timestamps.windows(2) {
                let gap = (pair[1] - pair[0]).num_seconds() as f64;
                prop_assert!(gap <= delta);
            }
        }
    }

    #[test]
    fn dji_majority_always_uses_ten_second_delta(
        offsets in prop::collection::vec(0i64..500, 4..20)
    ) {
        let records: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let mut rec = record_at(i, *offset);
                rec.name = format!("DJI_{i:04}.dng");
                rec
            })
            .collect();
        let brackets = snapforge_bracketing::group(&records, Some(1.0));

        for bracket in &brackets {
            let mut timestamps: Vec<_> = bracket
                .iter()
                .map(|r| {
                    chrono::NaiveDateTime::parse_from_str(
                        r.date_taken.as_ref().unwrap(),
                        "%Y:%m:%d %H:%M:%S",
                    )
                    .unwrap()
                })
                .collect();
            timestamps.sort();
            for pair in timestamps.windows(2) {
                let gap = (pair[1] - pair[0]).num_seconds() as f64;
                prop_assert!(gap <= 10.0);
            }
        }
    }
}

#[test]
fn brackets_are_emitted_in_ascending_earliest_timestamp_order() {
    let records = vec![
        record_at(0, 100),
        record_at(1, 0),
        record_at(2, 300),
        record_at(3, 101),
    ];
    let brackets = snapforge_bracketing::group(&records, Some(2.0));
    let earliest: Vec<_> = brackets
        .iter()
        .map(|bracket| bracket[0].date_taken.clone().unwrap())
        .collect();
    let mut sorted = earliest.clone();
    sorted.sort();
    assert_eq!(earliest, sorted);
}

#[test]
fn literal_scenario_non_dji_chains_through_middle_gaps() {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let mk = |offset: i64, name: &str| {
        let ts = base + chrono::Duration::seconds(offset);
        let mut rec = FileMetadataRecord::new(name, format!("/{name}"));
        rec.date_taken = Some(ts.format("%Y:%m:%d %H:%M:%S").to_string());
        rec
    };
    let records = vec![
        mk(0, "a.jpg"),
        mk(1, "b.jpg"),
        mk(3, "c.jpg"),
        mk(4, "d.jpg"),
        mk(20, "e.jpg"),
    ];
    let brackets = snapforge_bracketing::group(&records, Some(2.0));
    assert_eq!(brackets.len(), 2);
    assert_eq!(brackets[0].len(), 4);
    assert_eq!(brackets[1].len(), 1);
}
