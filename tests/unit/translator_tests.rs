/*!
 * Tests for the retrying translator
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use heritage_translator::app_config::BatchConfig;
use heritage_translator::errors::ProviderError;
use heritage_translator::providers::mock::{MockProvider, MOCK_TOKENS};
use heritage_translator::translation::{
    FailureKind, RequestSettings, RetryPolicy, RetryingTranslator, TranslationResult,
};

use crate::common;

/// Test a malformed body on every attempt degrades to the raw text
#[tokio::test]
async fn test_translate_withMalformedBody_shouldKeepRawTextAsContent() {
    let provider = MockProvider::malformed();
    let translator = common::translator(provider.clone(), 3);
    let job = common::job("D", "석굴암", "경주 토함산의 석굴 사원");

    match translator.translate(&job).await {
        TranslationResult::Success(entry) => {
            assert_eq!(entry.name_en, "석굴암");
            assert_eq!(entry.content_en, "name_en: 석굴암 (en) -- I could not produce JSON");
            assert!(entry.parse_fallback);
            assert_eq!(entry.tokens_used, MOCK_TOKENS * 3);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(provider.call_count(), 3);
}

/// Test a transport failure on every attempt
#[tokio::test]
async fn test_translate_withFailingProvider_shouldStopAtMaxAttempts() {
    let provider = MockProvider::failing();
    let translator = common::translator(provider.clone(), 3);

    let result = translator.translate(&common::job("E", "이름", "설명")).await;
    assert_eq!(
        result,
        TranslationResult::Failure {
            key: "E".into(),
            error: FailureKind::MaxRetriesExceeded,
        }
    );
    assert_eq!(provider.call_count(), 3);
}

/// Test a parse failure is retried and a later good answer wins
#[tokio::test]
async fn test_translate_withMalformedThenValidBody_shouldSucceedWithoutFallback() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let provider = MockProvider::scripted(move |request| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok("no json here".to_string())
        } else {
            Ok(MockProvider::json_answer(request))
        }
    });
    let translator = common::translator(provider, 3);

    match translator.translate(&common::job("A", "불국사", "경주의 사찰")).await {
        TranslationResult::Success(entry) => {
            assert_eq!(entry.name_en, "불국사 (en)");
            assert_eq!(entry.content_en, "경주의 사찰 (en)");
            assert!(!entry.parse_fallback);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test fenced answers are accepted on the first attempt
#[tokio::test]
async fn test_translate_withFencedAnswer_shouldParseFirstTime() {
    let provider = MockProvider::fenced();
    let translator = common::translator(provider.clone(), 3);

    assert!(translator.translate(&common::job("A", "종묘", "왕실 사당")).await.is_success());
    assert_eq!(provider.call_count(), 1);
}

/// Test the backoff delay is actually waited between attempts
#[tokio::test]
async fn test_translate_withBackoff_shouldWaitBetweenAttempts() {
    let provider = MockProvider::fail_first(1);
    let policy = RetryPolicy {
        max_attempts: 2,
        initial_delay: Duration::from_millis(50),
        multiplier: 1.5,
    };
    let translator = RetryingTranslator::new(Arc::new(provider), RequestSettings::default(), policy);

    let started = Instant::now();
    assert!(translator.translate(&common::job("A", "a", "b")).await.is_success());
    assert!(started.elapsed() >= Duration::from_millis(50));
}

/// Test the policy built from configuration
#[test]
fn test_retry_policy_fromConfig_shouldUseBatchSettings() {
    let config = BatchConfig {
        max_retries: 5,
        initial_backoff_secs: 1.0,
        backoff_multiplier: 2.0,
        ..BatchConfig::default()
    };

    let policy = RetryPolicy::from_config(&config);
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay_after(1), Duration::from_secs(1));
    assert_eq!(policy.delay_after(3), Duration::from_secs(4));
}

/// Test authentication errors are retried like any other error
#[tokio::test]
async fn test_translate_withAuthError_shouldRetryAndFail() {
    let provider = MockProvider::scripted(|_| Err(ProviderError::AuthenticationError("bad key".to_string())));
    let translator = common::translator(provider.clone(), 2);

    assert!(!translator.translate(&common::job("A", "a", "b")).await.is_success());
    assert_eq!(provider.call_count(), 2);
}
