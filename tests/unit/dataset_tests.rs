/*!
 * Tests for dataset loading, filtering and export
 */

use serde_json::Value;

use heritage_translator::dataset::{self, load_dataset_file, parse_dataset, write_export};
use heritage_translator::errors::DatasetError;

use crate::common;

/// Test the sample file parses with NaN normalized
#[test]
fn test_load_dataset_file_withNaNLiteral_shouldParseAsNull() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_sample_dataset(temp_dir.path()).unwrap();

    let data = load_dataset_file(&path, "HERITAGE_DATA").unwrap();
    assert_eq!(data.len(), 4);
    assert_eq!(data.records()[1].get("lat"), Some(&Value::Null));
    assert_eq!(data.records()[0].get("lat").and_then(Value::as_f64), Some(37.55));
}

/// Test filtering picks only keyed untranslated records
#[test]
fn test_untranslated_jobs_withMixedRecords_shouldSkipTranslatedAndUnkeyed() {
    let data = parse_dataset(common::SAMPLE_DATASET_JS, "HERITAGE_DATA").unwrap();

    let jobs = data.untranslated_jobs();
    let keys: Vec<&str> = jobs.iter().map(|j| j.key.as_str()).collect();
    assert_eq!(keys, vec!["11", "12"]);
    assert_eq!(jobs[0].name, "숭례문");
    assert_eq!(data.unkeyed_untranslated(), 1);
    assert_eq!(data.translated_count(), 1);
}

/// Test filtering is idempotent
#[test]
fn test_untranslated_jobs_calledTwice_shouldYieldSameJobs() {
    let data = parse_dataset(common::SAMPLE_DATASET_JS, "HERITAGE_DATA").unwrap();
    assert_eq!(data.untranslated_jobs(), data.untranslated_jobs());
}

/// Test category distribution for the run plan
#[test]
fn test_category_distribution_withSampleJobs_shouldCountPerCategory() {
    let data = parse_dataset(common::SAMPLE_DATASET_JS, "HERITAGE_DATA").unwrap();
    let jobs = data.untranslated_jobs();
    assert_eq!(data.category_distribution(&jobs), vec![("국보".to_string(), 2)]);
}

/// Test missing array name
#[test]
fn test_parse_dataset_withWrongArrayName_shouldFail() {
    let result = parse_dataset(common::SAMPLE_DATASET_JS, "OTHER_DATA");
    assert!(matches!(result, Err(DatasetError::ArrayNotFound(name)) if name == "OTHER_DATA"));
}

/// Test non-object elements are rejected with their index
#[test]
fn test_parse_dataset_withNonObjectElement_shouldReportIndex() {
    let result = parse_dataset("const HERITAGE_DATA = [{\"key_asno\": \"1\"}, 5];", "HERITAGE_DATA");
    assert!(matches!(result, Err(DatasetError::NotAnObject(1))));
}

/// Test the export can be loaded again and keeps unknown fields and order
#[test]
fn test_write_export_withSampleData_shouldReloadIdentically() {
    let temp_dir = common::create_temp_dir().unwrap();
    let data = parse_dataset(common::SAMPLE_DATASET_JS, "HERITAGE_DATA").unwrap();

    let path = write_export(&data, "HERITAGE_DATA", temp_dir.path()).unwrap();
    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("heritage-data-complete-"));
    assert!(file_name.ends_with(".js"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("const HERITAGE_DATA = ["));
    assert!(text.trim_end().ends_with("];"));
    assert!(text.contains("숭례문"));

    let reloaded = load_dataset_file(&path, "HERITAGE_DATA").unwrap();
    assert_eq!(reloaded, data);

    let first = serde_json::to_value(&reloaded.records()[0]).unwrap();
    let keys: Vec<&str> = first.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["key_asno", "name", "content", "kdcd_name", "lat"]);
}

/// Test the string-aware normalizer through the public re-export
#[test]
fn test_normalize_non_finite_withTokensInsideStrings_shouldKeepThem() {
    let input = r#"[{"content": "Infinity of NaN", "x": NaN}]"#;
    assert_eq!(dataset::normalize_non_finite(input), r#"[{"content": "Infinity of NaN", "x": null}]"#);
}
