/*!
 * # Heritage Translator
 *
 * A Rust library for batch translation of cultural heritage records into
 * English using an OpenAI-compatible chat completion API.
 *
 * ## Features
 *
 * - Load the heritage dataset from a remote JS file or a local copy
 * - Translate only the records without an English name and description
 * - Bounded worker pool with per-record retries and exponential backoff
 * - Periodic atomic checkpoints of successful translations
 * - Key-based merge and export of the enriched dataset
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `dataset`: Record model, dataset loading and export
 * - `translation`: Translation pipeline:
 *   - `translation::translator`: Retrying translator around a provider
 *   - `translation::batch`: Worker pool and result collection
 *   - `translation::checkpoint`: Background checkpoint writer
 *   - `translation::merge`: Merging results back into the dataset
 * - `providers`: Provider trait and clients:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scriptable provider for tests
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod dataset;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunOutcome};
pub use dataset::{Dataset, Record, RecordKey};
pub use errors::{CheckpointError, ConfigError, DatasetError, ProviderError};
pub use translation::{BatchRunner, RetryingTranslator, TranslationJob, TranslationResult};
