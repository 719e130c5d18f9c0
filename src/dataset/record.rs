use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::translation::TranslationJob;

/// Field holding the unique designation key
pub const KEY_FIELD: &str = "key_asno";
/// Native-language name
pub const NAME_FIELD: &str = "name";
/// Native-language description
pub const CONTENT_FIELD: &str = "content";
/// English name, filled by the merge
pub const NAME_EN_FIELD: &str = "name_en";
/// English description, filled by the merge
pub const CONTENT_EN_FIELD: &str = "content_en";
/// Category label
pub const CATEGORY_FIELD: &str = "kdcd_name";

/// Unique key of a heritage record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One heritage entity.
///
/// The record keeps the JSON object exactly as loaded (field order included),
/// so fields this tool knows nothing about survive the round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Wrap an already parsed JSON object
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a record from its core fields, mostly useful in tests
    pub fn new(key: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(KEY_FIELD.to_string(), Value::String(key.into()));
        fields.insert(NAME_FIELD.to_string(), Value::String(name.into()));
        fields.insert(CONTENT_FIELD.to_string(), Value::String(content.into()));
        Self { fields }
    }

    /// Builder-style setter for English fields
    pub fn with_translation(mut self, name_en: impl Into<String>, content_en: impl Into<String>) -> Self {
        self.set_translation(name_en, content_en);
        self
    }

    /// Builder-style setter for an arbitrary field
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// The unique key; numeric keys are rendered as text
    pub fn key(&self) -> Option<RecordKey> {
        match self.fields.get(KEY_FIELD)? {
            Value::String(s) if !s.trim().is_empty() => Some(RecordKey(s.clone())),
            Value::Number(n) => Some(RecordKey(n.to_string())),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn name(&self) -> &str {
        self.text(NAME_FIELD).unwrap_or("")
    }

    pub fn content(&self) -> &str {
        self.text(CONTENT_FIELD).unwrap_or("")
    }

    pub fn name_en(&self) -> Option<&str> {
        self.text(NAME_EN_FIELD)
    }

    pub fn content_en(&self) -> Option<&str> {
        self.text(CONTENT_EN_FIELD)
    }

    pub fn category(&self) -> Option<&str> {
        self.text(CATEGORY_FIELD)
    }

    /// Raw field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Both English fields are present and non-empty; whitespace counts as filled
    pub fn is_translated(&self) -> bool {
        let filled = |v: Option<&str>| v.is_some_and(|s| !s.is_empty());
        filled(self.name_en()) && filled(self.content_en())
    }

    /// Overwrite the English fields, keeping their position when they already exist
    pub fn set_translation(&mut self, name_en: impl Into<String>, content_en: impl Into<String>) {
        self.fields.insert(NAME_EN_FIELD.to_string(), Value::String(name_en.into()));
        self.fields.insert(CONTENT_EN_FIELD.to_string(), Value::String(content_en.into()));
    }
}

/// The ordered collection of records loaded for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// One job per record that still lacks an English name or description.
    ///
    /// Records without a usable key cannot be merged back and are skipped.
    /// The result depends only on the dataset, so filtering twice yields the
    /// same jobs.
    pub fn untranslated_jobs(&self) -> Vec<TranslationJob> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.is_translated())
            .filter_map(|(index, record)| {
                let key = record.key()?;
                Some(TranslationJob::new(key, record.name(), record.content()).at_index(index))
            })
            .collect()
    }

    /// Untranslated records that were skipped because they have no key
    pub fn unkeyed_untranslated(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.is_translated() && r.key().is_none())
            .count()
    }

    pub fn translated_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_translated()).count()
    }

    /// Record counts per category among the given jobs' records, largest first
    pub fn category_distribution(&self, jobs: &[TranslationJob]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for job in jobs {
            let category = job
                .index
                .and_then(|i| self.records.get(i))
                .and_then(Record::category)
                .unwrap_or("Other");
            *counts.entry(category).or_insert(0) += 1;
        }

        let mut sorted: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}
