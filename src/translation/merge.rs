/*!
 * Key-based merge of translation results into the dataset.
 */

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::dataset::{Dataset, RecordKey};
use super::job::{TranslatedEntry, TranslationResult};

/// Write successful translations back into the matching records.
///
/// Failures are ignored. When the results hold several successes for the
/// same key, the last one wins. Records without a matching key are left
/// untouched. Returns the dataset and the number of distinct keys that
/// matched at least one record.
pub fn merge(mut dataset: Dataset, results: &[TranslationResult]) -> (Dataset, usize) {
    let lookup: HashMap<&RecordKey, &TranslatedEntry> = results
        .iter()
        .filter_map(|result| match result {
            TranslationResult::Success(entry) => Some((&entry.key, entry)),
            TranslationResult::Failure { .. } => None,
        })
        .collect();

    if lookup.is_empty() {
        return (dataset, 0);
    }

    let mut matched: HashSet<RecordKey> = HashSet::new();
    for record in dataset.records_mut() {
        let Some(key) = record.key() else {
            continue;
        };
        if let Some(entry) = lookup.get(&key) {
            record.set_translation(entry.name_en.as_str(), entry.content_en.as_str());
            matched.insert(key);
        }
    }

    let unmatched = lookup.len() - matched.len();
    if unmatched > 0 {
        debug!("{} translated keys had no matching record", unmatched);
    }

    (dataset, matched.len())
}
