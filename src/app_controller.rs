use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::dataset::{self, Dataset, Record, RecordKey};
use crate::file_utils::FileManager;
use crate::providers::{OpenAICompatible, Provider};
use crate::translation::metrics::{format_duration, RunEstimate};
use crate::translation::{
    merge, BatchOptions, BatchRunner, CancellationFlag, CheckpointWriter, RequestSettings,
    RetryPolicy, RetryingTranslator,
};

// @module: Application controller for heritage translation runs

/// Number of categories listed in the run plan
const PLAN_CATEGORIES: usize = 10;

/// Number of records shown in the post-run quality sample
const SAMPLE_SIZE: usize = 3;

/// Characters of each description shown in the quality sample
const SAMPLE_PREVIEW_CHARS: usize = 80;

/// What the operator is asked to confirm
#[derive(Debug, Clone)]
pub struct RunPlan {
    // @field: Untranslated records that will be sent
    pub jobs: usize,
    // @field: Most frequent categories among the jobs
    pub top_categories: Vec<(String, usize)>,
    // @field: Token, cost and duration estimate
    pub estimate: RunEstimate,
}

/// Figures of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Distinct keys written back into the dataset
    pub updated: usize,
    pub total_tokens: u64,
    pub export_path: PathBuf,
    pub checkpoints: Vec<PathBuf>,
    pub cancelled: bool,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every keyed record already had a translation
    NothingToDo,
    /// The operator declined the plan
    Aborted,
    /// The batch ran and the enriched dataset was exported
    Completed(RunSummary),
}

/// Main application controller for heritage translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the live provider; fails before any work when the credential is missing
    pub fn build_provider(&self) -> Result<OpenAICompatible> {
        let provider = &self.config.provider;
        let api_key = provider
            .resolve_api_key()
            .context("API credential is required")?;
        Ok(OpenAICompatible::new(
            api_key,
            provider.endpoint.clone(),
            provider.model.clone(),
            provider.timeout(),
        ))
    }

    /// Run against the configured provider
    pub async fn run<F>(&self, confirm: F, cancel: CancellationFlag) -> Result<RunOutcome>
    where
        F: FnOnce(&RunPlan) -> bool,
    {
        let provider = self.build_provider()?;
        info!("🚀 Heritage translator: {} via {}", provider.model(), self.config.provider.endpoint);
        self.run_with_provider(Arc::new(provider), confirm, cancel).await
    }

    /// Run the whole pipeline with the given provider
    pub async fn run_with_provider<P, F>(&self, provider: Arc<P>, confirm: F, cancel: CancellationFlag) -> Result<RunOutcome>
    where
        P: Provider + 'static,
        F: FnOnce(&RunPlan) -> bool,
    {
        let start_time = std::time::Instant::now();

        let dataset = self.load_dataset().await?;
        info!("Loaded {} records ({} already translated)", dataset.len(), dataset.translated_count());

        let skipped = dataset.unkeyed_untranslated();
        if skipped > 0 {
            warn!("Skipping {} untranslated records without a key", skipped);
        }

        let jobs = dataset.untranslated_jobs();
        if jobs.is_empty() {
            info!("Nothing to translate, every record already has an English translation");
            return Ok(RunOutcome::NothingToDo);
        }

        provider
            .test_connection()
            .await
            .context("Provider connectivity check failed")?;
        info!("Provider connection OK");

        let plan = RunPlan {
            jobs: jobs.len(),
            top_categories: dataset
                .category_distribution(&jobs)
                .into_iter()
                .take(PLAN_CATEGORIES)
                .collect(),
            estimate: RunEstimate::new(jobs.len(), self.config.batch.workers, &self.config.pricing),
        };
        Self::log_plan(&plan);

        if !confirm(&plan) {
            info!("Run aborted by operator");
            return Ok(RunOutcome::Aborted);
        }
        if cancel.is_cancelled() {
            warn!("Interrupted before the batch started, nothing was translated");
            return Ok(RunOutcome::Aborted);
        }

        FileManager::ensure_dir(&self.config.output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", self.config.output_dir))?;

        let translator = RetryingTranslator::new(
            provider,
            RequestSettings::from(&self.config.provider),
            RetryPolicy::from_config(&self.config.batch),
        )
        .with_cancellation(cancel);

        let runner = BatchRunner::new(Arc::new(translator), BatchOptions::from(&self.config.batch))
            .with_pricing(self.config.pricing.clone())
            .with_checkpoints(CheckpointWriter::new(self.checkpoint_dir()))
            .with_progress_bar(Self::progress_bar(jobs.len() as u64));

        let outcome = runner.run(jobs).await;

        let (merged, updated) = merge(dataset, &outcome.results);
        info!("Merged {} translations into the dataset", updated);

        let export_path = dataset::write_export(&merged, &self.config.source.array_name, &self.config.output_dir)
            .context("Failed to write the enriched dataset")?;
        info!("Exported {} records to {:?}", merged.len(), export_path);

        let translated: HashSet<&RecordKey> = outcome.successes().map(|entry| &entry.key).collect();
        Self::log_quality_sample(&merged, &translated);

        info!("Run complete in {}", format_duration(start_time.elapsed()));

        Ok(RunOutcome::Completed(RunSummary {
            succeeded: outcome.success_count(),
            failed: outcome.failure_count(),
            updated,
            total_tokens: outcome.total_tokens,
            export_path,
            checkpoints: outcome.checkpoints,
            cancelled: outcome.cancelled,
        }))
    }

    /// Load the dataset from the local path when set, otherwise from the URL
    pub async fn load_dataset(&self) -> Result<Dataset> {
        let source = &self.config.source;
        match &source.local_path {
            Some(path) => dataset::load_dataset_file(path, &source.array_name)
                .with_context(|| format!("Failed to load dataset from {:?}", path)),
            None => {
                dataset::fetch_dataset(&source.url, &source.array_name, source.fetch_timeout())
                    .await
                    .with_context(|| format!("Failed to fetch dataset from {}", source.url))
            }
        }
    }

    /// Checkpoint directory; relative paths live under the output directory
    pub fn checkpoint_dir(&self) -> PathBuf {
        resolve_under(&self.config.output_dir, &self.config.batch.checkpoint_dir)
    }

    fn progress_bar(total: u64) -> ProgressBar {
        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }

    fn log_plan(plan: &RunPlan) {
        info!("Run plan: {} records to translate", plan.jobs);
        if !plan.top_categories.is_empty() {
            info!("Top categories:");
            for (category, count) in &plan.top_categories {
                info!("  {:<20} {}", category, count);
            }
        }
        info!(
            "Estimate: ~{} tokens | ~${:.2} | ~{:.1} hours",
            plan.estimate.tokens,
            plan.estimate.cost_usd,
            plan.estimate.duration.as_secs_f64() / 3600.0
        );
    }

    fn log_quality_sample(dataset: &Dataset, translated: &HashSet<&RecordKey>) {
        let candidates: Vec<&Record> = dataset
            .records()
            .iter()
            .filter(|record| record.key().is_some_and(|key| translated.contains(&key)))
            .collect();
        if candidates.is_empty() {
            return;
        }

        info!("Quality sample:");
        for record in candidates.choose_multiple(&mut rand::rng(), SAMPLE_SIZE) {
            info!(
                "  [{}] {} -> {}",
                record.category().unwrap_or("Other"),
                record.name(),
                record.name_en().unwrap_or_default()
            );
            info!("    KO: {}", preview(record.content()));
            info!("    EN: {}", preview(record.content_en().unwrap_or_default()));
        }
    }
}

fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SAMPLE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
