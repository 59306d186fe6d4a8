//! Core data models for Commitguard
//!
//! Two families live here: the API-shaped [`CommitPayload`] that arrives from
//! the hosting service (or is synthesised from local git history), and the
//! persisted records ([`Commit`], [`File`], [`Developer`], [`PullRequest`])
//! the history store keeps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of a file inside a single commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Copied => write!(f, "copied"),
            FileStatus::Changed => write!(f, "changed"),
            FileStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Added/modified/removed file counts of one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub added: u32,
    pub modified: u32,
    pub removed: u32,
}

impl FileCounts {
    pub fn from_statuses<I: IntoIterator<Item = FileStatus>>(statuses: I) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                FileStatus::Added => counts.added += 1,
                FileStatus::Modified => counts.modified += 1,
                FileStatus::Removed => counts.removed += 1,
                _ => {}
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// API-shaped payload
// ---------------------------------------------------------------------------

/// Commit as returned by the hosting service's commit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
    #[serde(default)]
    pub url: String,
    pub commit: CommitDetail,
    /// Linked account, absent when the author email maps to no account
    #[serde(default)]
    pub author: Option<AccountRef>,
    #[serde(default)]
    pub stats: CommitStatsPayload,
    #[serde(default)]
    pub files: Vec<FilePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub author: Signature,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    pub login: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommitStatsPayload {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub filename: String,
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    /// Unified diff text; absent for binary or oversized files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_filename: Option<String>,
}

impl CommitPayload {
    /// Username the commit is attributed to.
    ///
    /// Prefers the linked account login, then the author email, then the name.
    pub fn username(&self) -> &str {
        if let Some(account) = &self.author {
            return &account.login;
        }
        if !self.commit.author.email.is_empty() {
            return &self.commit.author.email;
        }
        &self.commit.author.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.commit.author.date
    }

    pub fn day(&self) -> NaiveDate {
        self.commit.author.date.date_naive()
    }

    pub fn file_counts(&self) -> FileCounts {
        FileCounts::from_statuses(self.files.iter().map(|f| f.status))
    }

    /// Paths of files with the given status
    pub fn files_with_status(&self, status: FileStatus) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.filename.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// A contributor account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Developer {
    pub username: String,
    /// Public contribution count from the identity's wider history
    pub contributions: u64,
    pub account_created: DateTime<Utc>,
    pub followers: u64,
}

/// Association between a commit and a file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// A file identity tracked across renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    /// Developer who added the file; set once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A persisted commit. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub day: NaiveDate,
    pub message: String,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub changed_chars: u64,
    pub added_files: u32,
    pub modified_files: u32,
    pub removed_files: u32,
    pub renamed_files: u32,
    /// Files touched per extension
    pub languages: BTreeMap<String, u32>,
    pub files: Vec<FileChange>,
}

impl Commit {
    pub fn changed_lines(&self) -> u64 {
        self.lines_added + self.lines_removed
    }

    pub fn file_counts(&self) -> FileCounts {
        FileCounts {
            added: self.added_files,
            modified: self.modified_files,
            removed: self.removed_files,
        }
    }

    pub fn touches(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
    Closed,
}

/// A pull request authored by a developer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub author: String,
    pub state: PullState,
    pub merged: bool,
}

impl PullRequest {
    /// Closed without being merged
    pub fn is_rejected(&self) -> bool {
        self.state == PullState::Closed && !self.merged
    }
}

/// File extension as used for sensitivity and language accounting.
///
/// Everything after the last `.`; a name without a dot is its own extension.
pub fn file_extension(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
