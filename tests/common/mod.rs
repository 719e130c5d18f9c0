/*!
 * Common test utilities for the heritage-translator test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use heritage_translator::app_config::Config;
use heritage_translator::dataset::RecordKey;
use heritage_translator::providers::mock::MockProvider;
use heritage_translator::translation::{RequestSettings, RetryPolicy, RetryingTranslator, TranslationJob};

/// Route library logs to the test harness; repeated calls are ignored
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Source file with two untranslated records, one translated record,
/// one record without a key and a `NaN` coordinate
pub const SAMPLE_DATASET_JS: &str = r#"// Korean heritage dataset
const HERITAGE_DATA = [
  {"key_asno": "11", "name": "숭례문", "content": "서울 중구에 있는 조선시대 성문", "kdcd_name": "국보", "lat": 37.55},
  {"key_asno": "12", "name": "원각사지 십층석탑", "content": "탑골공원에 있는 석탑", "kdcd_name": "국보", "lat": NaN},
  {"key_asno": "21", "name": "흥인지문", "content": "동대문", "kdcd_name": "보물", "name_en": "Heunginjimun Gate", "content_en": "East gate of Seoul"},
  {"name": "이름 없는 유적", "content": "키가 없다", "kdcd_name": "사적"}
];

export default HERITAGE_DATA;
"#;

/// Writes the sample dataset into `dir`
pub fn create_sample_dataset(dir: &Path) -> Result<PathBuf> {
    create_test_file(dir, "heritage-data.js", SAMPLE_DATASET_JS)
}

/// Config reading a local dataset and writing into `output_dir`, with fast retries
pub fn local_config(dataset: &Path, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.local_path = Some(dataset.to_path_buf());
    config.output_dir = output_dir.to_path_buf();
    config.batch.workers = 2;
    config.batch.initial_backoff_secs = 0.0;
    config.batch.backoff_multiplier = 1.0;
    config.batch.progress_interval = 1;
    config
}

/// Job with a given key and native fields
pub fn job(key: &str, name: &str, content: &str) -> TranslationJob {
    TranslationJob::new(RecordKey::new(key), name, content)
}

/// Translator with immediate retries around the mock
pub fn translator(provider: MockProvider, attempts: u32) -> Arc<RetryingTranslator<MockProvider>> {
    Arc::new(RetryingTranslator::new(
        Arc::new(provider),
        RequestSettings::default(),
        RetryPolicy::immediate(attempts),
    ))
}
