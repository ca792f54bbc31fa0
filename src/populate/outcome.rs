// Per-item outcomes and the run summary.
// Every manifest entry and auxiliary image resolves to exactly one outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an item was not fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A feed file with the same timestamp is already cached.
    AlreadyCached,
    /// The file name would overwrite an auxiliary image.
    AuxiliaryCollision,
}

/// Which step of an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Decode,
    Encode,
    Write,
    InvalidEntry,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Decode => "decode",
            FailureKind::Encode => "encode",
            FailureKind::Write => "write",
            FailureKind::InvalidEntry => "invalid entry",
        };
        f.write_str(label)
    }
}

/// Result of processing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Cached,
    Skipped(SkipReason),
    Failed { kind: FailureKind, message: String },
}

impl ItemOutcome {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        ItemOutcome::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Failure counts broken down by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub fetch: u64,
    pub decode: u64,
    pub encode: u64,
    pub write: u64,
    pub invalid_entry: u64,
}

/// Totals for one populator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub failures_by_kind: FailureCounts,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            successes: 0,
            failures: 0,
            skipped: 0,
            failures_by_kind: FailureCounts::default(),
        }
    }

    /// Count one item outcome.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Cached => self.successes += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed { kind, .. } => {
                self.failures += 1;
                let counts = &mut self.failures_by_kind;
                match kind {
                    FailureKind::Fetch => counts.fetch += 1,
                    FailureKind::Decode => counts.decode += 1,
                    FailureKind::Encode => counts.encode += 1,
                    FailureKind::Write => counts.write += 1,
                    FailureKind::InvalidEntry => counts.invalid_entry += 1,
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, if it has finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at
            .map(|finished| finished.signed_duration_since(self.started_at))
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Caching complete. Successes: {}, Failures: {}",
            self.successes, self.failures
        )
    }
}
