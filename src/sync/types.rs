//! Reconciliation options, results and progress reporting.

use serde::Serialize;
use std::fmt;

/// Default number of items between progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

/// How a reconciliation run treats existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Rewrite entries that already exist instead of skipping them.
    pub overwrite_existing: bool,
    /// Delete entries of the collection that are absent from the batch.
    pub prune_unmatched: bool,
    /// Emit a progress notification every this many items.
    pub progress_interval: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            prune_unmatched: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// One token or entry that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    /// Full name of the token or entry.
    pub name: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Terminal summary of a reconciliation run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncSummary {
    /// Entries created.
    pub created: usize,
    /// Existing entries rewritten (including delete-then-recreate on type change).
    pub overwritten: usize,
    /// Existing entries left untouched.
    pub skipped: usize,
    /// Entries removed by the prune pass.
    pub deleted: usize,
    /// Tokens or deletions that failed.
    pub failed: usize,
    /// One item per failure, in processing order.
    pub errors: Vec<ItemError>,
    /// Non-fatal batch observations, such as duplicate names.
    pub warnings: Vec<String>,
}

impl SyncSummary {
    /// Tokens written successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.created + self.overwritten
    }

    /// Tokens processed (excludes deletions).
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.overwritten + self.skipped + self.failed
    }

    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} deleted, {} failed",
            self.created, self.overwritten, self.skipped, self.deleted, self.failed
        )
    }
}

/// Reconciliation pass being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Writing,
    Aliasing,
    Pruning,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Writing => "writing",
            Self::Aliasing => "aliasing",
            Self::Pruning => "pruning",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coarse progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
}

/// Receives progress notifications from a run.
pub trait ProgressSink {
    fn on_progress(&mut self, progress: Progress);
}

/// Discards all notifications.
impl ProgressSink for () {
    fn on_progress(&mut self, _progress: Progress) {}
}
