/*!
 * Provider implementations for the completion API.
 *
 * This module contains the client boundary of the translator:
 * - `openai`: OpenAI-compatible chat completions client (Upstage Solar by default)
 * - `mock`: scripted provider used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub use self::openai::{ChatMessage, ChatRequest, ChatResponse, OpenAICompatible};

/// Common trait for all LLM providers
///
/// Implementations are shared read-only across every worker of a batch, so
/// they must not hold mutable state that needs coordination.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a chat request
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<ChatResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod openai;
