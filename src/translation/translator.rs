/*!
 * Retrying translator.
 *
 * Wraps a provider with a bounded retry loop and exponential backoff. The
 * translator never fails: every outcome, including exhausted retries, is
 * expressed as a `TranslationResult`.
 *
 * - Transport/API errors are retried; when attempts run out the job becomes
 *   `Failure { MaxRetriesExceeded }`.
 * - Unparsable responses are retried too; when attempts run out the raw text
 *   is kept as the English description and the native name is reused, so a
 *   paid response is never thrown away.
 */

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{BatchConfig, ProviderConfig};
use crate::providers::{ChatRequest, Provider};
use super::extract::{extract_payload, ExtractedPayload};
use super::job::{FailureKind, TranslatedEntry, TranslationJob, TranslationResult};
use super::prompts;

/// Bounded retry schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_delay: Duration,
    /// Growth factor of the wait after each failed attempt
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: Duration::from_secs_f64(config.initial_backoff_secs),
            multiplier: config.backoff_multiplier,
        }
    }

    /// Policy without waits, for tests and dry runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        self.initial_delay.mul_f64(self.multiplier.powi(exponent))
    }
}

/// Cooperative cancellation shared by the runner and its workers
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-request generation settings
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub reasoning_effort: Option<String>,
}

impl From<&ProviderConfig> for RequestSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            reasoning_effort: config.reasoning_effort.clone(),
        }
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

/// Translator applying `RetryPolicy` around a provider
#[derive(Debug)]
pub struct RetryingTranslator<P: Provider> {
    provider: Arc<P>,
    settings: RequestSettings,
    policy: RetryPolicy,
    cancel: CancellationFlag,
}

impl<P: Provider> RetryingTranslator<P> {
    pub fn new(provider: Arc<P>, settings: RequestSettings, policy: RetryPolicy) -> Self {
        Self {
            provider,
            settings,
            policy,
            cancel: CancellationFlag::new(),
        }
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// The single request sent for a job
    pub fn build_request(&self, job: &TranslationJob) -> ChatRequest {
        ChatRequest::new(self.settings.model.clone())
            .add_message("system", prompts::SYSTEM_INSTRUCTION)
            .add_message("user", prompts::user_payload(&job.name, &job.content))
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .reasoning_effort(self.settings.reasoning_effort.clone())
    }

    /// Translate one job, retrying as the policy allows
    pub async fn translate(&self, job: &TranslationJob) -> TranslationResult {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut tokens_used = 0u64;

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return self.cancelled(job);
            }

            match self.provider.complete(self.build_request(job)).await {
                Ok(response) => {
                    tokens_used += response.total_tokens();

                    match extract_payload(response.text()) {
                        payload @ ExtractedPayload::Parsed(_) => {
                            return TranslationResult::Success(TranslatedEntry {
                                key: job.key.clone(),
                                name_en: payload.field("name_en").unwrap_or(&job.name).to_string(),
                                content_en: payload.field("content_en").unwrap_or(&job.content).to_string(),
                                tokens_used,
                                parse_fallback: false,
                            });
                        }
                        ExtractedPayload::Raw(raw) if attempt == max_attempts => {
                            warn!("Keeping unparsed response for {} after {} attempts", job.label(), attempt);
                            return TranslationResult::Success(TranslatedEntry {
                                key: job.key.clone(),
                                name_en: job.name.clone(),
                                content_en: raw,
                                tokens_used,
                                parse_fallback: true,
                            });
                        }
                        ExtractedPayload::Raw(_) => {
                            debug!("Attempt {}/{} for {} returned no JSON", attempt, max_attempts, job.label());
                        }
                    }
                }
                Err(e) if attempt == max_attempts => {
                    warn!("Giving up on {} after {} attempts: {}", job.label(), attempt, e);
                }
                Err(e) => {
                    debug!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, job.label(), e);
                }
            }

            if attempt < max_attempts {
                if self.cancel.is_cancelled() {
                    return self.cancelled(job);
                }
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        TranslationResult::Failure {
            key: job.key.clone(),
            error: FailureKind::MaxRetriesExceeded,
        }
    }

    fn cancelled(&self, job: &TranslationJob) -> TranslationResult {
        TranslationResult::Failure {
            key: job.key.clone(),
            error: FailureKind::Cancelled,
        }
    }
}
