//! History store
//!
//! The scoring core never talks to a database or a remote API directly. It
//! reads commit history through [`HistoryStore`]; [`MemoryStore`] is the
//! in-process implementation used by the CLI (backed by JSON snapshots) and
//! by tests.

mod memory;

pub use memory::MemoryStore;

use crate::error::EngineResult;
use crate::models::{Commit, Developer, File, PullRequest};
use crate::stats::{Baseline, BaselineScope, DailyCommitStats};
use chrono::NaiveDate;

/// Which files to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter<'a> {
    All,
    /// Files whose recorded owner is this developer
    OwnedBy(&'a str),
    /// Files appearing in any of this developer's commits
    TouchedBy(&'a str),
}

/// Read access to persisted history.
pub trait HistoryStore {
    fn developer(&self, username: &str) -> Option<&Developer>;

    /// The developer's commits, most recent first
    fn commits_by(&self, username: &str) -> Vec<&Commit>;

    fn files(&self, filter: FileFilter<'_>) -> Vec<&File>;

    /// Baseline for a scope.
    ///
    /// Fails with `StaleBaseline` when commits were added since the last
    /// recompute and `InsufficientData` when the scope has no commits.
    fn baseline(&self, scope: &BaselineScope) -> EngineResult<&Baseline>;

    fn total_commits(&self) -> usize;

    /// Every developer's daily row for `day`
    fn daily_stats_on(&self, day: NaiveDate) -> Vec<&DailyCommitStats>;

    /// One developer's daily rows, oldest first
    fn daily_history(&self, username: &str) -> Vec<&DailyCommitStats>;

    fn pull_requests(&self, username: &str) -> Vec<&PullRequest>;

    /// Contribution count from the identity's public history, if known
    fn external_contributions(&self, username: &str) -> Option<u64> {
        self.developer(username).map(|d| d.contributions)
    }

    /// No developer record exists yet for `username`
    fn is_first_commit(&self, username: &str) -> bool {
        self.developer(username).is_none()
    }
}
