/*!
 * Translation of heritage records through an AI provider.
 *
 * The work is split into several submodules:
 *
 * - `job`: jobs and their tagged results
 * - `prompts`: the instruction and per-record payload sent to the model
 * - `extract`: recovering the JSON payload from free-form model text
 * - `translator`: the retrying translator around a provider
 * - `batch`: the bounded worker pool and result collector
 * - `checkpoint`: periodic snapshots of successful results
 * - `metrics`: progress, throughput and cost figures
 * - `merge`: joining results back into the dataset by key
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOptions, BatchOutcome, BatchRunner};
pub use self::checkpoint::{CheckpointHandle, CheckpointSnapshot, CheckpointWriter};
pub use self::job::{FailureKind, TranslatedEntry, TranslationJob, TranslationResult};
pub use self::merge::merge;
pub use self::translator::{CancellationFlag, RequestSettings, RetryPolicy, RetryingTranslator};

// Submodules
pub mod batch;
pub mod checkpoint;
pub mod extract;
pub mod job;
pub mod merge;
pub mod metrics;
pub mod prompts;
pub mod translator;
