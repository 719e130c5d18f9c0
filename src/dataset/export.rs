use chrono::Local;
use std::path::{Path, PathBuf};

use crate::errors::DatasetError;
use crate::file_utils::FileManager;
use super::record::Dataset;

/// Render the dataset as `const NAME = [...];`, ready for the display layer
pub fn render_js_module(dataset: &Dataset, array_name: &str) -> Result<String, DatasetError> {
    let json = serde_json::to_string_pretty(dataset)?;
    Ok(format!("const {} = {};", array_name, json))
}

/// Timestamped file name of the final export
pub fn export_file_name(timestamp: &str) -> String {
    format!("heritage-data-complete-{}.js", timestamp)
}

/// Write the enriched dataset into `output_dir` and return the file path
pub fn write_export(dataset: &Dataset, array_name: &str, output_dir: &Path) -> Result<PathBuf, DatasetError> {
    let content = render_js_module(dataset, array_name)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = output_dir.join(export_file_name(&timestamp));

    FileManager::write_atomic(&path, content.as_bytes())?;
    Ok(path)
}
