/*!
 * Batch translation processing.
 *
 * Runs every job through a `RetryingTranslator` on a fixed-size worker pool:
 * - a dispatcher spawns one task per job, gated by a semaphore so in-flight
 *   provider calls never exceed the worker count; a task that panics is
 *   reported as a failure for its key,
 * - workers send each result over a channel to a single collector that owns
 *   the batch state and drains results in completion order,
 * - the collector logs progress and hands snapshot copies of the successes to
 *   a background checkpoint writer.
 */

use indicatif::ProgressBar;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

use crate::app_config::{BatchConfig, PricingConfig};
use crate::providers::Provider;
use super::checkpoint::{CheckpointHandle, CheckpointSnapshot, CheckpointWriter};
use super::job::{FailureKind, TranslatedEntry, TranslationJob, TranslationResult};
use super::metrics::{format_duration, ProgressReport};
use super::translator::{CancellationFlag, RetryingTranslator};

/// Pool size and reporting cadence
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of concurrent provider calls
    pub workers: usize,
    /// Checkpoint every time the success count reaches a multiple of this
    pub backup_interval: usize,
    /// Log a progress line every this many processed jobs
    pub progress_interval: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            workers: config.workers,
            backup_interval: config.backup_interval,
            progress_interval: config.progress_interval,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One result per job, in completion order
    pub results: Vec<TranslationResult>,
    pub total_tokens: u64,
    pub elapsed: Duration,
    /// The run was interrupted before every job could be attempted
    pub cancelled: bool,
    /// Checkpoint files written during the run, oldest first
    pub checkpoints: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn successes(&self) -> impl Iterator<Item = &TranslatedEntry> {
        self.results.iter().filter_map(|result| match result {
            TranslationResult::Success(entry) => Some(entry),
            TranslationResult::Failure { .. } => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

/// Counters owned by the collector
struct BatchState {
    total: usize,
    processed: usize,
    successes: Vec<TranslatedEntry>,
    failed: usize,
    total_tokens: u64,
    last_checkpoint: usize,
    started: Instant,
}

impl BatchState {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            successes: Vec::new(),
            failed: 0,
            total_tokens: 0,
            last_checkpoint: 0,
            started: Instant::now(),
        }
    }

    fn report(&self, pricing: &PricingConfig) -> ProgressReport {
        ProgressReport::new(
            self.processed,
            self.total,
            self.successes.len(),
            self.failed,
            self.total_tokens,
            self.started.elapsed(),
            pricing,
        )
    }
}

/// Worker pool driving a `RetryingTranslator` over a list of jobs
pub struct BatchRunner<P: Provider + 'static> {
    translator: Arc<RetryingTranslator<P>>,
    options: BatchOptions,
    pricing: PricingConfig,
    checkpoints: Option<CheckpointWriter>,
    progress_bar: Option<ProgressBar>,
}

impl<P: Provider + 'static> BatchRunner<P> {
    pub fn new(translator: Arc<RetryingTranslator<P>>, options: BatchOptions) -> Self {
        Self {
            translator,
            options,
            pricing: PricingConfig::default(),
            checkpoints: None,
            progress_bar: None,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    /// Write checkpoints into the given writer's directory
    pub fn with_checkpoints(mut self, writer: CheckpointWriter) -> Self {
        self.checkpoints = Some(writer);
        self
    }

    /// Advance this bar on every completed job
    pub fn with_progress_bar(mut self, progress_bar: ProgressBar) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    /// Flag shared with the translator; cancelling it stops dispatching
    pub fn cancellation(&self) -> &CancellationFlag {
        self.translator.cancellation()
    }

    /// Run every job and wait until each one has produced exactly one result
    pub async fn run(&self, jobs: Vec<TranslationJob>) -> BatchOutcome {
        let total = jobs.len();
        if total == 0 {
            return BatchOutcome::default();
        }

        let workers = self.options.workers.max(1);
        info!("Starting batch of {} jobs with {} workers", total, workers);

        let (tx, mut rx) = mpsc::unbounded_channel::<TranslationResult>();
        let dispatcher = self.dispatch(jobs, workers, tx);
        let checkpoint_handle = self.checkpoints.clone().map(CheckpointWriter::spawn);

        let mut state = BatchState::new(total);
        let mut results = Vec::with_capacity(total);

        while let Some(result) = rx.recv().await {
            self.record(&mut state, &result, checkpoint_handle.as_ref());
            results.push(result);
        }

        if let Err(e) = dispatcher.await {
            warn!("Dispatcher stopped unexpectedly: {}", e);
        }

        let cancelled = self.cancellation().is_cancelled();
        if cancelled {
            warn!(
                "Batch cancelled after {} of {} jobs; saving {} successful results",
                results.iter().filter(|r| !is_cancelled(r)).count(),
                total,
                state.successes.len()
            );
            if state.successes.len() > state.last_checkpoint {
                submit_snapshot(checkpoint_handle.as_ref(), &mut state);
            }
        }

        let checkpoints = match checkpoint_handle {
            Some(handle) => handle.finish().await,
            None => Vec::new(),
        };

        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }

        let outcome = BatchOutcome {
            results,
            total_tokens: state.total_tokens,
            elapsed: state.started.elapsed(),
            cancelled,
            checkpoints,
        };
        self.log_summary(&outcome);
        outcome
    }

    /// Spawn one task per job, never more than `workers` at once
    fn dispatch(
        &self,
        jobs: Vec<TranslationJob>,
        workers: usize,
        tx: mpsc::UnboundedSender<TranslationResult>,
    ) -> tokio::task::JoinHandle<()> {
        let translator = Arc::clone(&self.translator);
        let semaphore = Arc::new(Semaphore::new(workers));

        tokio::spawn(async move {
            for job in jobs {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let _ = tx.send(cancelled_result(&job));
                        continue;
                    }
                };

                if translator.cancellation().is_cancelled() {
                    drop(permit);
                    let _ = tx.send(cancelled_result(&job));
                    continue;
                }

                let translator = Arc::clone(&translator);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let key = job.key.clone();
                    // A panicking translation still has to report for its key
                    let worker = tokio::spawn(async move { translator.translate(&job).await });
                    let result = match worker.await {
                        Ok(result) => result,
                        Err(e) => {
                            error!("Worker for {} stopped unexpectedly: {}", key, e);
                            TranslationResult::Failure {
                                key,
                                error: FailureKind::WorkerPanicked,
                            }
                        }
                    };
                    drop(permit);
                    let _ = tx.send(result);
                });
            }
        })
    }

    fn record(&self, state: &mut BatchState, result: &TranslationResult, checkpoints: Option<&CheckpointHandle>) {
        state.processed += 1;
        state.total_tokens += result.tokens_used();

        match result {
            TranslationResult::Success(entry) => {
                state.successes.push(entry.clone());
                let interval = self.options.backup_interval;
                if interval > 0 && state.successes.len() % interval == 0 {
                    submit_snapshot(checkpoints, state);
                }
            }
            TranslationResult::Failure { key, error } => {
                state.failed += 1;
                if *error != FailureKind::Cancelled {
                    warn!("Translation failed for {}: {}", key, error);
                }
            }
        }

        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
            pb.set_message(format!("{} ok / {} failed", state.successes.len(), state.failed));
        }

        let interval = self.options.progress_interval;
        if interval > 0 && (state.processed % interval == 0 || state.processed == state.total) {
            info!("{}", state.report(&self.pricing));
        }
    }

    fn log_summary(&self, outcome: &BatchOutcome) {
        let successes = outcome.success_count();
        let processed = outcome.results.len();
        let success_rate = if processed > 0 {
            successes as f64 / processed as f64 * 100.0
        } else {
            0.0
        };
        let secs = outcome.elapsed.as_secs_f64();
        let per_hour = if secs > 0.0 { processed as f64 / secs * 3600.0 } else { 0.0 };

        info!("Batch finished in {}", format_duration(outcome.elapsed));
        info!(
            "  {} succeeded, {} failed ({:.1}% success rate)",
            successes,
            outcome.failure_count(),
            success_rate
        );
        info!(
            "  {:.0} items/h | {} tokens | estimated cost ${:.2}",
            per_hour,
            outcome.total_tokens,
            self.pricing.cost_of(outcome.total_tokens)
        );
    }
}

fn submit_snapshot(checkpoints: Option<&CheckpointHandle>, state: &mut BatchState) {
    let Some(handle) = checkpoints else {
        return;
    };
    let snapshot = CheckpointSnapshot::capture(&state.successes, state.total);
    match handle.submit(snapshot) {
        Ok(()) => state.last_checkpoint = state.successes.len(),
        Err(e) => warn!("Could not queue checkpoint: {}", e),
    }
}

fn cancelled_result(job: &TranslationJob) -> TranslationResult {
    TranslationResult::Failure {
        key: job.key.clone(),
        error: FailureKind::Cancelled,
    }
}

fn is_cancelled(result: &TranslationResult) -> bool {
    matches!(result, TranslationResult::Failure { error: FailureKind::Cancelled, .. })
}
