use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::RecordKey;

/// One unit of work: the native fields of a single untranslated record
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationJob {
    /// Key used to merge the result back
    pub key: RecordKey,
    /// Native-language name
    pub name: String,
    /// Native-language description
    pub content: String,
    /// Position of the record in the dataset, for diagnostics
    pub index: Option<usize>,
}

impl TranslationJob {
    pub fn new(key: RecordKey, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            content: content.into(),
            index: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Short label for log lines
    pub fn label(&self) -> String {
        let name: String = self.name.chars().take(40).collect();
        format!("{} ({})", name, self.key)
    }
}

/// Why a job ended without a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Every attempt ended in a transport or API error
    MaxRetriesExceeded,
    /// The run was cancelled before the job could finish
    Cancelled,
    /// The worker task died before reporting a result
    WorkerPanicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxRetriesExceeded => write!(f, "max retries exceeded"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::WorkerPanicked => write!(f, "worker panicked"),
        }
    }
}

/// A successful translation, as stored in checkpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedEntry {
    #[serde(rename = "key_asno")]
    pub key: RecordKey,
    pub name_en: String,
    pub content_en: String,
    #[serde(rename = "tokens")]
    pub tokens_used: u64,
    /// The response could not be parsed and was kept verbatim
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub parse_fallback: bool,
}

/// Tagged outcome of a job
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult {
    Success(TranslatedEntry),
    Failure { key: RecordKey, error: FailureKind },
}

impl TranslationResult {
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Success(entry) => &entry.key,
            Self::Failure { key, .. } => key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn tokens_used(&self) -> u64 {
        match self {
            Self::Success(entry) => entry.tokens_used,
            Self::Failure { .. } => 0,
        }
    }
}
