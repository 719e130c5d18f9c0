/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always answers with strict JSON
 * - `MockProvider::fenced()` - Answers with JSON wrapped in a code fence
 * - `MockProvider::malformed()` - Answers with text that is not JSON
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::fail_first(n)` - Fails the first `n` calls, then works
 * - `MockProvider::scripted(..)` - Delegates every call to a closure
 *
 * Translations produced by the working behaviors are derived from the native
 * name and description in the user payload, so a test can check that every
 * key received its own translation.
 */

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider};
use crate::translation::prompts;

/// Tokens reported for every successful mock response
pub const MOCK_TOKENS: u64 = 42;

/// Handler signature for scripted mocks
pub type MockHandler = dyn Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync;

/// Behavior mode for the mock provider
#[derive(Clone)]
pub enum MockBehavior {
    /// Always succeeds with a strict JSON body
    Working,
    /// Succeeds with the JSON body inside a ```json fence
    Fenced,
    /// Succeeds with a body that is not JSON
    Malformed,
    /// Fails intermittently (every Nth request); 0 never fails
    Intermittent { fail_every: usize },
    /// Fails the first N requests, then works
    FailFirst { failures: usize },
    /// Always fails with an error
    Failing,
    /// Simulates slow responses, then works
    Slow { delay_ms: u64 },
    /// Every request is answered by a closure
    Scripted(Arc<MockHandler>),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Working => write!(f, "Working"),
            Self::Fenced => write!(f, "Fenced"),
            Self::Malformed => write!(f, "Malformed"),
            Self::Intermittent { fail_every } => write!(f, "Intermittent({})", fail_every),
            Self::FailFirst { failures } => write!(f, "FailFirst({})", failures),
            Self::Failing => write!(f, "Failing"),
            Self::Slow { delay_ms } => write!(f, "Slow({}ms)", delay_ms),
            Self::Scripted(_) => write!(f, "Scripted"),
        }
    }
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Requests currently inside `complete`
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` has reached
    max_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that wraps its JSON in a code fence
    pub fn fenced() -> Self {
        Self::new(MockBehavior::Fenced)
    }

    /// Create a mock whose bodies never parse
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock that fails its first `failures` requests
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that sleeps before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock driven by a closure
    pub fn scripted<F>(handler: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::new(MockBehavior::Scripted(Arc::new(handler)))
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Peak number of concurrent `complete` calls
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Strict JSON answer for the native fields carried by a request
    pub fn json_answer(request: &ChatRequest) -> String {
        let (name, content) = request
            .message_content("user")
            .map(prompts::native_fields)
            .unwrap_or_default();

        serde_json::json!({
            "name_en": format!("{} (en)", name),
            "content_en": format!("{} (en)", content),
        })
        .to_string()
    }

    async fn respond(&self, request: &ChatRequest, count: usize) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Working => Ok(Self::json_answer(request)),

            MockBehavior::Fenced => Ok(format!(
                "Here is the translation:\n```json\n{}\n```",
                Self::json_answer(request)
            )),

            MockBehavior::Malformed => Ok(format!(
                "name_en: {} (en) -- I could not produce JSON",
                request
                    .message_content("user")
                    .map(prompts::native_fields)
                    .unwrap_or_default()
                    .0
            )),

            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::json_answer(request))
                }
            }

            MockBehavior::FailFirst { failures } => {
                if count < *failures {
                    Err(ProviderError::ConnectionError(format!(
                        "Simulated connection reset (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(Self::json_answer(request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(Self::json_answer(request))
            }

            MockBehavior::Scripted(handler) => handler(request),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        // Yield so concurrent callers overlap even when the behavior is instant
        tokio::task::yield_now().await;
        let result = self.respond(&request, count).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(|text| ChatResponse::from_text(text, MOCK_TOKENS))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection refused".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
