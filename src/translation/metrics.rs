/*!
 * Progress and cost metrics for a batch run.
 *
 * These are plain calculations over the collector's counters; they feed log
 * lines and never influence control flow.
 */

use std::fmt;
use std::time::Duration;

use crate::app_config::PricingConfig;

/// Point-in-time view of a running batch
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_tokens: u64,
    pub elapsed: Duration,
    pub cost_usd: f64,
}

impl ProgressReport {
    pub fn new(
        processed: usize,
        total: usize,
        succeeded: usize,
        failed: usize,
        total_tokens: u64,
        elapsed: Duration,
        pricing: &PricingConfig,
    ) -> Self {
        Self {
            processed,
            total,
            succeeded,
            failed,
            total_tokens,
            elapsed,
            cost_usd: pricing.cost_of(total_tokens),
        }
    }

    pub fn percent_done(&self) -> f64 {
        ratio(self.processed, self.total) * 100.0
    }

    /// Share of processed jobs that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        ratio(self.succeeded, self.processed) * 100.0
    }

    /// Processed jobs per hour
    pub fn items_per_hour(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs * 3600.0
        } else {
            0.0
        }
    }

    /// Remaining time extrapolated from the average pace so far
    pub fn eta(&self) -> Option<Duration> {
        if self.processed == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.processed) as f64;
        let per_item = self.elapsed.as_secs_f64() / self.processed as f64;
        Some(Duration::from_secs_f64(per_item * remaining))
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eta = self
            .eta()
            .map(format_duration)
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "Progress: {}/{} ({:.1}%) | success rate {:.1}% | {:.0} items/h | elapsed {} | ETA {} | cost ${:.2}",
            self.processed,
            self.total,
            self.percent_done(),
            self.success_rate(),
            self.items_per_hour(),
            format_duration(self.elapsed),
            eta,
            self.cost_usd
        )
    }
}

/// Estimate shown before the operator confirms a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunEstimate {
    pub jobs: usize,
    pub tokens: u64,
    pub cost_usd: f64,
    pub duration: Duration,
}

impl RunEstimate {
    pub fn new(jobs: usize, workers: usize, pricing: &PricingConfig) -> Self {
        let tokens = jobs as u64 * pricing.estimated_tokens_per_job;
        let secs = jobs as f64 / workers.max(1) as f64 * pricing.estimated_secs_per_job;
        Self {
            jobs,
            tokens,
            cost_usd: pricing.cost_of(tokens),
            duration: Duration::from_secs_f64(secs),
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

// Format duration in a human-readable format (HH:MM:SS)
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
