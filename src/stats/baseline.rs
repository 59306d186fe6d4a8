//! Developer and repository baselines
//!
//! A baseline answers "what does a typical commit look like here?" for the five
//! tracked metrics: lines added, lines removed, and added/modified/removed
//! file counts. Each metric keeps mean, sample variance and standard deviation
//! over the full commit history of its scope.

use super::primitives::mean_and_variance;
use crate::error::{EngineError, EngineResult};
use crate::models::Commit;
use serde::{Deserialize, Serialize};

/// Which history a baseline summarises
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineScope {
    Developer(String),
    Repository,
}

impl std::fmt::Display for BaselineScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineScope::Developer(name) => write!(f, "developer '{}'", name),
            BaselineScope::Repository => write!(f, "repository"),
        }
    }
}

/// Spread of a single metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub stddev: f64,
    pub variance: f64,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        let (mean, variance) = mean_and_variance(values);
        Self {
            mean,
            stddev: variance.sqrt(),
            variance,
        }
    }

    pub fn new(mean: f64, stddev: f64) -> Self {
        Self {
            mean,
            stddev,
            variance: stddev * stddev,
        }
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.stddev
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.stddev
    }

    /// True when `value` lies strictly outside `[mean - stddev, mean + stddev]`
    pub fn is_outside(&self, value: f64) -> bool {
        value < self.lower() || value > self.upper()
    }
}

/// Baseline of a developer or of the whole repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub scope: BaselineScope,
    pub commit_count: usize,
    pub lines_added: MetricStats,
    pub lines_removed: MetricStats,
    pub added_files: MetricStats,
    pub modified_files: MetricStats,
    pub removed_files: MetricStats,
}

impl Baseline {
    /// Compute a baseline over `commits`.
    ///
    /// Fails with `InsufficientData` when there are no commits in scope.
    pub fn from_commits<'a, I>(scope: BaselineScope, commits: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = &'a Commit>,
    {
        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut added_files = Vec::new();
        let mut modified_files = Vec::new();
        let mut removed_files = Vec::new();

        for commit in commits {
            added.push(commit.lines_added as f64);
            removed.push(commit.lines_removed as f64);
            added_files.push(commit.added_files as f64);
            modified_files.push(commit.modified_files as f64);
            removed_files.push(commit.removed_files as f64);
        }

        if added.is_empty() {
            return Err(EngineError::InsufficientData {
                scope: scope.to_string(),
            });
        }

        Ok(Self {
            scope,
            commit_count: added.len(),
            lines_added: MetricStats::from_values(&added),
            lines_removed: MetricStats::from_values(&removed),
            added_files: MetricStats::from_values(&added_files),
            modified_files: MetricStats::from_values(&modified_files),
            removed_files: MetricStats::from_values(&removed_files),
        })
    }

    /// Metrics in a fixed order, paired with their names
    pub fn metrics(&self) -> [(&'static str, &MetricStats); 5] {
        [
            ("lines_added", &self.lines_added),
            ("lines_removed", &self.lines_removed),
            ("added_files", &self.added_files),
            ("modified_files", &self.modified_files),
            ("removed_files", &self.removed_files),
        ]
    }
}
