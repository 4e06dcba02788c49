//! Ingestion Integration Tests
//!
//! These tests read real files from disk and check the cleaned records the
//! windowing strategies rely on: ordering, merging, filling and ranges.

use rebate_dataset::{
    ingest_file, validate_chronology, validate_no_gaps, validate_ranges, DatasetError,
    IngestOptions, SchemaVariant,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "model;model_year;invoice_date;rebate;sales\n";

/// Write `body` to a file in a fresh temp dir.
fn write_input(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sales.csv");
    fs::write(&path, body).unwrap();
    (dir, path)
}

/// Three entities, unordered rows, duplicates and gaps.
fn mixed_body() -> String {
    let mut body = String::from(HEADER);
    body.push_str("Polo;2017;2017-03-03;100;4\n");
    body.push_str("Golf;2017;2017-03-01;250;11\n");
    body.push_str("Golf;2017;2017-03-01;350;9\n");
    body.push_str("Passat;2016;2017-03-02;;2\n");
    body.push_str("Golf;2017;2017-03-04;300;8\n");
    body.push_str("Polo;2017;2017-03-01;120;5\n");
    body.push_str("Golf;2017;2017-03-02;;\n");
    body
}

#[test]
fn test_same_day_rows_merge_to_mean_rebate_and_summed_sales() {
    let body = format!("{HEADER}Golf;2017;2017-01-01;10;5\nGolf;2017;2017-01-01;20;7\n");
    let (_dir, path) = write_input(&body);

    let output = ingest_file(&path, &IngestOptions::default()).unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].features, vec![15.0]);
    assert_eq!(output.records[0].targets, vec![12.0]);
}

#[test]
fn test_missing_days_are_synthesized_with_zeros() {
    let body = format!(
        "{HEADER}Golf;2017;2017-01-01;3;30\nGolf;2017;2017-01-02;4;40\nGolf;2017;2017-01-05;5;50\n"
    );
    let (_dir, path) = write_input(&body);

    let options = IngestOptions::default().with_missing_days(true);
    let output = ingest_file(&path, &options).unwrap();

    let days: Vec<i64> = output.records.iter().map(|r| r.day - output.records[0].day).collect();
    assert_eq!(days, vec![0, 1, 2, 3, 4]);
    for filled in &output.records[2..4] {
        assert!(filled.synthesized);
        assert_eq!(filled.features, vec![0.0]);
        assert_eq!(filled.targets, vec![0.0]);
    }
    assert_eq!(output.stats.days_synthesized, 2);
    assert!(validate_no_gaps(&output.records).is_valid());
}

#[test]
fn test_records_sorted_and_unique_per_entity() {
    let (_dir, path) = write_input(&mixed_body());

    let output = ingest_file(&path, &IngestOptions::default()).unwrap();

    assert!(validate_chronology(&output.records).is_valid());
    assert_eq!(output.stats.rows_accepted, 7);
    assert_eq!(output.stats.rows_merged, 1);
    assert_eq!(output.records.len(), 6);

    // Codes are allocated in order of first appearance
    assert_eq!(output.entity_name(2), Some("Polo"));
    assert_eq!(output.entity_name(3), Some("Golf"));
    assert_eq!(output.entity_name(4), Some("Passat"));
    assert_eq!(output.entity_ids(), vec![2, 3, 4]);

    // Empty numeric fields read as zero
    let golf = output.records_for(3);
    assert_eq!(golf.len(), 3);
    assert_eq!(golf[0].features, vec![300.0]);
    assert_eq!(golf[0].targets, vec![20.0]);
    assert_eq!(golf[1].features, vec![0.0]);
    assert_eq!(golf[1].targets, vec![0.0]);
}

#[test]
fn test_every_real_value_inside_ranges() {
    let (_dir, path) = write_input(&mixed_body());

    for add_missing_days in [false, true] {
        let options = IngestOptions::default().with_missing_days(add_missing_days);
        let output = ingest_file(&path, &options).unwrap();

        let result = validate_ranges(&output.records, &output.ranges);
        assert!(!result.has_errors(), "{result}");
        assert_eq!(output.ranges.targets[0].max, 20.0);
    }
}

#[test]
fn test_missing_days_align_every_entity() {
    let (_dir, path) = write_input(&mixed_body());

    let options = IngestOptions::default().with_missing_days(true);
    let output = ingest_file(&path, &options).unwrap();

    // 3 entities over 2017-03-01..=2017-03-04
    assert_eq!(output.records.len(), 12);
    for id in output.entity_ids() {
        assert_eq!(output.records_for(id).len(), 4);
    }
    assert!(validate_no_gaps(&output.records).is_valid());
    assert!(validate_chronology(&output.records).is_valid());
}

#[test]
fn test_encoder_round_trips_entity_names() {
    let (_dir, path) = write_input(&mixed_body());
    let output = ingest_file(&path, &IngestOptions::default()).unwrap();

    for name in ["Polo", "Golf", "Passat"] {
        let code = output.encoder.lookup(0, name).unwrap();
        assert_eq!(output.encoder.decode(0, code).unwrap(), name);
    }
    assert!(matches!(
        output.encoder.decode(0, 99),
        Err(DatasetError::UnknownCode { column: 0, code: 99 })
    ));
}

#[test]
fn test_split_layout_has_two_targets() {
    let body = "model;model_year;invoice_date;rebate;sales_with;sales_without\n\
                Golf;2017;2017-01-01;10;3;4\n\
                Golf;2017;2017-01-01;30;1;2\n\
                Golf;2017;2017-01-02;20;5;6\n";
    let (_dir, path) = write_input(body);

    let options = IngestOptions::default().with_schema(SchemaVariant::Split);
    let output = ingest_file(&path, &options).unwrap();

    assert_eq!(output.records[0].features, vec![20.0]);
    assert_eq!(output.records[0].targets, vec![4.0, 6.0]);
    assert_eq!(output.ranges.targets.len(), 2);
    assert_eq!(output.schema.target_width(), 2);
}

#[test]
fn test_restricted_filter_keeps_one_entity() {
    let (_dir, path) = write_input(&mixed_body());

    let options = IngestOptions::default()
        .with_entity_filter("Golf")
        .restrict_to_filter(true);
    let output = ingest_file(&path, &options).unwrap();

    assert_eq!(output.filter_id, Some(3));
    assert_eq!(output.entity_ids(), vec![3]);
    assert_eq!(output.stats.rows_filtered, 3);
}

#[test]
fn test_unknown_filter_entity() {
    let (_dir, path) = write_input(&mixed_body());

    let options = IngestOptions::default().with_entity_filter("Tiguan");
    let output = ingest_file(&path, &options).unwrap();

    assert_eq!(output.filter_id, None);
    assert_eq!(output.records.len(), 6);
}

#[test]
fn test_custom_delimiter_and_header_count() {
    let body = "exported 2017-04-01\nmodel,model_year,invoice_date,rebate,sales\n\
                Golf,2017,01.02.2017,5,10\n";
    let (_dir, path) = write_input(body);

    let options = IngestOptions {
        delimiter: ",".to_string(),
        skip_header_lines: 2,
        date_format: "%d.%m.%Y".to_string(),
        ..IngestOptions::default()
    };
    let output = ingest_file(&path, &options).unwrap();

    assert_eq!(output.records.len(), 1);
    // 2017-02-01
    assert_eq!(output.records[0].day, 17_198);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ingest_file(dir.path().join("absent.csv"), &IngestOptions::default()).unwrap_err();

    assert!(matches!(err, DatasetError::Io { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_bad_number_is_fatal() {
    let body = format!("{HEADER}Golf;2017;2017-01-01;ten;5\n");
    let (_dir, path) = write_input(&body);

    let err = ingest_file(&path, &IngestOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DatasetError::NumberFormat { line: 2, column: 3, .. }
    ));
}

#[test]
fn test_non_finite_number_is_fatal() {
    let body = format!("{HEADER}Golf;2017;2017-01-01;NaN;5\nGolf;2017;2017-01-02;3;inf\n");
    let (_dir, path) = write_input(&body);

    let err = ingest_file(&path, &IngestOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DatasetError::NumberFormat { line: 2, column: 3, ref value } if value == "NaN"
    ));
    assert!(err.is_fatal());
}
