/*!
 * Integration tests for the full application lifecycle
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use heritage_translator::app_controller::{Controller, RunOutcome};
use heritage_translator::dataset::load_dataset_file;
use heritage_translator::providers::mock::MockProvider;
use heritage_translator::translation::CancellationFlag;

use crate::common;

/// Test the full run translates, merges and exports
#[tokio::test]
async fn test_controller_run_withWorkingProvider_shouldExportEnrichedDataset() {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();

    let outcome = controller
        .run_with_provider(Arc::new(MockProvider::working()), |plan| plan.jobs == 2, CancellationFlag::new())
        .await
        .unwrap();

    let summary = match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.updated, 2);
    assert!(summary.export_path.starts_with(&output_dir));

    let exported = load_dataset_file(&summary.export_path, "HERITAGE_DATA").unwrap();
    assert_eq!(exported.len(), 4);
    assert_eq!(exported.records()[0].name_en(), Some("숭례문 (en)"));
    assert_eq!(exported.records()[2].name_en(), Some("Heunginjimun Gate"));
    assert!(exported.records()[3].name_en().is_none());
    assert!(exported.untranslated_jobs().is_empty());
}

/// Test running on an exported file has nothing left to do
#[tokio::test]
async fn test_controller_run_onExportedFile_shouldBeNoOp() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");

    let first = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();
    let export_path = match first
        .run_with_provider(Arc::new(MockProvider::working()), |_| true, CancellationFlag::new())
        .await
        .unwrap()
    {
        RunOutcome::Completed(summary) => summary.export_path,
        other => panic!("unexpected outcome: {:?}", other),
    };

    let provider = MockProvider::working();
    let second = Controller::with_config(common::local_config(&export_path, &output_dir)).unwrap();
    let outcome = second
        .run_with_provider(Arc::new(provider.clone()), |_| true, CancellationFlag::new())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::NothingToDo));
    assert_eq!(provider.call_count(), 0);
}

/// Test declining the plan aborts before any translation or output
#[tokio::test]
async fn test_controller_run_whenDeclined_shouldAbortWithoutOutput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();
    let provider = MockProvider::working();
    let asked = Arc::new(AtomicBool::new(false));
    let asked_flag = Arc::clone(&asked);

    let outcome = controller
        .run_with_provider(
            Arc::new(provider.clone()),
            move |plan| {
                asked_flag.store(true, Ordering::SeqCst);
                assert_eq!(plan.top_categories, vec![("국보".to_string(), 2)]);
                assert_eq!(plan.estimate.tokens, 3000);
                false
            },
            CancellationFlag::new(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted));
    assert!(asked.load(Ordering::SeqCst));
    assert_eq!(provider.call_count(), 0);
    assert!(!output_dir.exists());
}

/// Test a failing connectivity check is fatal
#[tokio::test]
async fn test_controller_run_withUnreachableProvider_shouldFailBeforeConfirmation() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let controller = Controller::with_config(common::local_config(&dataset_path, temp_dir.path())).unwrap();

    let result = controller
        .run_with_provider(
            Arc::new(MockProvider::failing()),
            |_| panic!("confirmation must not be requested"),
            CancellationFlag::new(),
        )
        .await;

    let error = result.unwrap_err();
    assert!(format!("{:#}", error).contains("connectivity check failed"));
}

/// Test a missing credential is fatal before any work
#[tokio::test]
async fn test_controller_run_withoutCredential_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let mut config = common::local_config(&dataset_path, temp_dir.path());
    config.provider.api_key_env = "HERITAGE_TRANSLATOR_TEST_MISSING_KEY".to_string();
    let controller = Controller::with_config(config).unwrap();

    let result = controller.run(|_| true, CancellationFlag::new()).await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("HERITAGE_TRANSLATOR_TEST_MISSING_KEY"));
}

/// Test a failed record stays untranslated in the export and is picked up next time
#[tokio::test]
async fn test_controller_run_withPartialFailure_shouldKeepFailedRecordForNextRun() {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();

    let provider = MockProvider::scripted(|request| {
        if request.message_content("user").unwrap_or_default().contains("원각사지") {
            Err(heritage_translator::ProviderError::RequestFailed("timeout".to_string()))
        } else {
            Ok(MockProvider::json_answer(request))
        }
    });

    let summary = match controller
        .run_with_provider(Arc::new(provider), |_| true, CancellationFlag::new())
        .await
        .unwrap()
    {
        RunOutcome::Completed(summary) => summary,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let exported = load_dataset_file(&summary.export_path, "HERITAGE_DATA").unwrap();
    let remaining: Vec<String> = exported.untranslated_jobs().iter().map(|j| j.key.to_string()).collect();
    assert_eq!(remaining, vec!["12".to_string()]);
}

/// Test an interrupt during the confirmation prompt aborts without exporting
#[tokio::test]
async fn test_controller_run_interruptedAtPrompt_shouldAbortWithoutOutput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();
    let provider = MockProvider::working();
    let cancel = CancellationFlag::new();
    let interrupt = cancel.clone();

    let outcome = controller
        .run_with_provider(
            Arc::new(provider.clone()),
            move |_| {
                interrupt.cancel();
                true
            },
            cancel,
        )
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted));
    assert_eq!(provider.call_count(), 0);
    assert!(!output_dir.exists());
}

/// Test a flag cancelled before the run starts also aborts cleanly
#[tokio::test]
async fn test_controller_run_withPreCancelledFlag_shouldAbortWithoutOutput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dataset_path = common::create_sample_dataset(temp_dir.path()).unwrap();
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_config(common::local_config(&dataset_path, &output_dir)).unwrap();
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let outcome = controller
        .run_with_provider(Arc::new(MockProvider::working()), |_| true, cancel)
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted));
    assert!(!output_dir.exists());
}
