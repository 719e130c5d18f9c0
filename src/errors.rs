/*!
 * Error types for the heritage translator.
 *
 * This module contains custom error types for the different stages of a run,
 * using the thiserror crate for ergonomic error definitions. Per-job errors
 * never leave the translator; everything here is either a provider failure
 * that the translator retries, or a fatal condition for the whole run.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while loading or exporting the heritage dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The remote source could not be fetched
    #[error("Failed to fetch dataset from {url}: {message}")]
    Fetch {
        /// Source URL
        url: String,
        /// Transport or status error
        message: String,
    },

    /// The named array assignment was not found in the source text
    #[error("Could not find the {0} array in the source text")]
    ArrayNotFound(String),

    /// The array literal was found but is not valid structured data
    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// An array element is not an object
    #[error("Dataset entry {0} is not an object")]
    NotAnObject(usize),

    /// Reading or writing a dataset file failed
    #[error("Dataset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while writing a checkpoint
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Filesystem error
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be serialized
    #[error("Checkpoint serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The background writer stopped before the snapshot was handed over
    #[error("Checkpoint writer is no longer running")]
    WriterClosed,
}

/// Invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric setting is out of range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the setting
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A URL setting could not be parsed
    #[error("Invalid URL for {field}: {source}")]
    InvalidUrl {
        /// Dotted path of the setting
        field: &'static str,
        /// Parse error
        source: url::ParseError,
    },

    /// The API credential is not present in the environment
    #[error("Environment variable {0} is not set")]
    MissingCredential(String),
}
