/*!
 * Periodic checkpoints of successful translations.
 *
 * A checkpoint is one JSON file per trigger, named after the number of
 * results it holds and the time it was taken. Files are written to a
 * temporary name and renamed into place, so a checkpoint is either complete
 * or absent. Checkpoints are never read back by the batch engine.
 */

use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::CheckpointError;
use crate::file_utils::FileManager;
use super::job::TranslatedEntry;

/// Immutable copy of the accumulated successes at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    /// Local time the snapshot was taken, `YYYYmmdd_HHMMSS`
    pub timestamp: String,
    /// Number of successful results in this snapshot
    pub completed: usize,
    /// Number of jobs in the run
    pub total: usize,
    pub results: Vec<TranslatedEntry>,
}

impl CheckpointSnapshot {
    /// Copy the given results into a new snapshot stamped with the current time
    pub fn capture(results: &[TranslatedEntry], total: usize) -> Self {
        Self {
            timestamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            completed: results.len(),
            total,
            results: results.to_vec(),
        }
    }

    /// `backup_{completed}_{timestamp}.json`
    pub fn file_name(&self) -> String {
        format!("backup_{}_{}.json", self.completed, self.timestamp)
    }
}

/// Writes snapshots into a checkpoint directory
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    dir: PathBuf,
}

impl CheckpointWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize a snapshot to its own file and return the path
    pub fn write(&self, snapshot: &CheckpointSnapshot) -> Result<PathBuf, CheckpointError> {
        let path = self.dir.join(snapshot.file_name());
        let json = serde_json::to_vec_pretty(snapshot)?;
        FileManager::write_atomic(&path, &json)?;
        Ok(path)
    }

    /// Move the writer onto a background task.
    ///
    /// Snapshots are written one at a time in the order they are submitted,
    /// so the caller never waits on disk I/O.
    pub fn spawn(self) -> CheckpointHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<CheckpointSnapshot>();

        let task = tokio::spawn(async move {
            let mut written = Vec::new();
            while let Some(snapshot) = rx.recv().await {
                let writer = self.clone();
                let completed = snapshot.completed;
                let result = tokio::task::spawn_blocking(move || writer.write(&snapshot)).await;

                match result {
                    Ok(Ok(path)) => {
                        info!("Checkpoint saved: {} ({} results)", path.display(), completed);
                        written.push(path);
                    }
                    Ok(Err(e)) => warn!("Checkpoint with {} results failed: {}", completed, e),
                    Err(e) => warn!("Checkpoint task with {} results panicked: {}", completed, e),
                }
            }
            written
        });

        CheckpointHandle { tx, task }
    }
}

/// Submission side of a background checkpoint writer
#[derive(Debug)]
pub struct CheckpointHandle {
    tx: mpsc::UnboundedSender<CheckpointSnapshot>,
    task: JoinHandle<Vec<PathBuf>>,
}

impl CheckpointHandle {
    /// Queue a snapshot without waiting for it to be written
    pub fn submit(&self, snapshot: CheckpointSnapshot) -> Result<(), CheckpointError> {
        self.tx.send(snapshot).map_err(|_| CheckpointError::WriterClosed)
    }

    /// Wait for every queued snapshot and return the files written, in order
    pub async fn finish(self) -> Vec<PathBuf> {
        drop(self.tx);
        match self.task.await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Checkpoint writer stopped unexpectedly: {}", e);
                Vec::new()
            }
        }
    }
}
