/*!
 * Heritage dataset model, loading and export.
 *
 * - `record`: the `Record`/`Dataset` types and the untranslated filter
 * - `loader`: locating and parsing the array literal in the source file
 * - `export`: writing the enriched dataset back as a JS constant
 */

pub mod export;
pub mod loader;
pub mod record;

pub use self::export::{render_js_module, write_export};
pub use self::loader::{fetch_dataset, load_dataset_file, normalize_non_finite, parse_dataset};
pub use self::record::{Dataset, Record, RecordKey};
