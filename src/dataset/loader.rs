/*!
 * Loading the heritage dataset.
 *
 * The source is a JavaScript file that assigns an array literal to a named
 * constant (`HERITAGE_DATA = [...];`). The array is located with a regex,
 * non-finite numeric literals (`NaN`, `Infinity`) that JavaScript accepts but
 * JSON does not are rewritten to `null`, and the result is parsed as JSON.
 */

use log::{debug, info};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::errors::DatasetError;
use super::record::{Dataset, Record};

/// Locate the array literal assigned to `array_name` in a larger text blob
pub fn extract_array_literal<'a>(text: &'a str, array_name: &str) -> Result<&'a str, DatasetError> {
    let pattern = format!(r"{}\s*=\s*(\[[\s\S]*?\]);", regex::escape(array_name));
    let re = Regex::new(&pattern)
        .map_err(|_| DatasetError::ArrayNotFound(array_name.to_string()))?;

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| DatasetError::ArrayNotFound(array_name.to_string()))
}

/// Replace bare `NaN`, `Infinity` and `-Infinity` tokens with `null`.
///
/// Occurrences inside string literals are left alone.
pub fn normalize_non_finite(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = literal;

    while let Some(c) = rest.chars().next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            rest = &rest[1..];
            continue;
        }

        let token = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t) && !is_ident_char(rest[t.len()..].chars().next()));

        match token {
            Some(t) if !is_ident_char(out.chars().next_back()) => {
                out.push_str("null");
                rest = &rest[t.len()..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    out
}

fn is_ident_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Parse the dataset out of the source text
pub fn parse_dataset(text: &str, array_name: &str) -> Result<Dataset, DatasetError> {
    let literal = extract_array_literal(text, array_name)?;
    let normalized = normalize_non_finite(literal);
    let values: Vec<Value> = serde_json::from_str(&normalized)?;

    let records = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Object(map) => Ok(Record::from_map(map)),
            _ => Err(DatasetError::NotAnObject(i)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} records from {} array", records.len(), array_name);
    Ok(Dataset::new(records))
}

/// Fetch the source file over HTTP and parse it
pub async fn fetch_dataset(url: &str, array_name: &str, timeout: Duration) -> Result<Dataset, DatasetError> {
    info!("Loading dataset from {}", url);

    let fetch_error = |message: String| DatasetError::Fetch {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    let response = client.get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP status {}", status)));
    }

    let text = response.text().await.map_err(|e| fetch_error(e.to_string()))?;
    parse_dataset(&text, array_name)
}

/// Read the source file from disk and parse it
pub fn load_dataset_file(path: &Path, array_name: &str) -> Result<Dataset, DatasetError> {
    info!("Loading dataset from {:?}", path);
    let text = std::fs::read_to_string(path)?;
    parse_dataset(&text, array_name)
}
