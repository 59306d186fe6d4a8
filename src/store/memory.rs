//! In-memory history store with JSON snapshots

use super::{FileFilter, HistoryStore};
use crate::error::{EngineError, EngineResult};
use crate::features::count_changed_chars;
use crate::models::{
    file_extension, Commit, CommitPayload, Developer, File, FileChange, FileStatus, PullRequest,
};
use crate::stats::{compute_daily_stats, Baseline, BaselineScope, DailyCommitStats};
use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// History kept in process memory.
///
/// Ingesting a commit marks the author's and the repository's baselines stale;
/// [`MemoryStore::recompute`] must run before they are served again.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    developers: BTreeMap<String, Developer>,
    commits: Vec<Commit>,
    files: Vec<File>,
    pulls: Vec<PullRequest>,
    developer_baselines: BTreeMap<String, Baseline>,
    repo_baseline: Option<Baseline>,
    daily: Vec<DailyCommitStats>,
    stale_developers: BTreeSet<String>,
    repo_stale: bool,
    /// Stored commit ids
    #[serde(skip)]
    commit_ids: FxHashSet<String>,
    /// Current path to index into `files`
    #[serde(skip)]
    paths: FxHashMap<String, usize>,
    /// Previous path to index into `files`, latest rename only
    #[serde(skip)]
    previous_paths: FxHashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryStore::save`]
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut store: Self = serde_json::from_str(&content)?;
        store.rebuild_indexes();
        debug!(
            "Loaded snapshot {} ({} developers, {} commits)",
            path.display(),
            store.developers.len(),
            store.commits.len()
        );
        Ok(store)
    }

    fn rebuild_indexes(&mut self) {
        self.commit_ids = self.commits.iter().map(|c| c.id.clone()).collect();
        self.paths.clear();
        self.previous_paths.clear();
        for (idx, file) in self.files.iter().enumerate() {
            self.paths.insert(file.path.clone(), idx);
            if let Some(previous) = &file.previous_path {
                self.previous_paths.insert(previous.clone(), idx);
            }
        }
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Insert or replace a developer record
    pub fn add_developer(&mut self, developer: Developer) {
        self.developers.insert(developer.username.clone(), developer);
    }

    pub fn add_pull_request(&mut self, pull: PullRequest) {
        self.pulls.push(pull);
    }

    pub fn developers(&self) -> impl Iterator<Item = &Developer> {
        self.developers.values()
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// True when any baseline needs a recompute
    pub fn is_stale(&self) -> bool {
        self.repo_stale || !self.stale_developers.is_empty()
    }

    /// Persist a commit from its API payload.
    ///
    /// Returns `false` when a commit with the same id is already stored.
    pub fn ingest_commit(&mut self, username: &str, payload: &CommitPayload) -> EngineResult<bool> {
        if !self.developers.contains_key(username) {
            return Err(EngineError::UnknownDeveloper {
                username: username.to_string(),
            });
        }
        if self.commit_ids.contains(&payload.sha) {
            debug!("Commit {} already stored, skipping", payload.sha);
            return Ok(false);
        }

        let timestamp = payload.timestamp();
        let mut commit = Commit {
            id: payload.sha.clone(),
            author: username.to_string(),
            timestamp,
            day: timestamp.date_naive(),
            message: payload.commit.message.clone(),
            lines_added: payload.stats.additions,
            lines_removed: payload.stats.deletions,
            changed_chars: 0,
            added_files: 0,
            modified_files: 0,
            removed_files: 0,
            renamed_files: 0,
            languages: BTreeMap::new(),
            files: Vec::new(),
        };

        for file_data in &payload.files {
            *commit
                .languages
                .entry(file_extension(&file_data.filename).to_string())
                .or_insert(0) += 1;

            if let Some(patch) = &file_data.patch {
                commit.changed_chars += count_changed_chars(patch);
            }

            let idx = self.record_file(
                username,
                file_data.status,
                &file_data.filename,
                file_data.previous_filename.as_deref(),
            );
            let path = &self.files[idx].path;

            if !commit.touches(path) {
                commit.files.push(FileChange {
                    path: path.clone(),
                    status: file_data.status,
                    patch: file_data.patch.clone(),
                });
            }

            match file_data.status {
                FileStatus::Added => commit.added_files += 1,
                FileStatus::Modified => commit.modified_files += 1,
                FileStatus::Removed => commit.removed_files += 1,
                FileStatus::Renamed => commit.renamed_files += 1,
                _ => {}
            }
        }

        self.commit_ids.insert(commit.id.clone());
        self.commits.push(commit);
        self.stale_developers.insert(username.to_string());
        self.repo_stale = true;
        Ok(true)
    }

    /// Track the file identity touched by one file change.
    ///
    /// Returns the index of the resolved [`File`] in `files`.
    fn record_file(&mut self, username: &str, status: FileStatus, path: &str, previous: Option<&str>) -> usize {
        let idx = match self.find_file(path) {
            Some(idx) => idx,
            None => {
                self.files.push(File {
                    path: path.to_string(),
                    previous_path: None,
                    owner: None,
                });
                let idx = self.files.len() - 1;
                self.paths.insert(path.to_string(), idx);
                idx
            }
        };

        if status == FileStatus::Renamed {
            if let Some(previous) = previous {
                // Only the latest rename keeps a given previous path
                if let Some(prior) = self.previous_paths.insert(previous.to_string(), idx) {
                    self.files[prior].previous_path = None;
                }
                if let Some(old) = self.files[idx].previous_path.replace(previous.to_string()) {
                    if old != previous {
                        self.previous_paths.remove(&old);
                    }
                }
            }
        }

        if status == FileStatus::Added && self.files[idx].owner.is_none() {
            self.files[idx].owner = Some(username.to_string());
        }
        idx
    }

    /// Lookup by current path, then by previous path
    fn find_file(&self, path: &str) -> Option<usize> {
        self.paths
            .get(path)
            .or_else(|| self.previous_paths.get(path))
            .copied()
    }

    /// Rebuild every baseline and daily row from the full history.
    pub fn recompute(&mut self) {
        self.developer_baselines.clear();
        self.daily.clear();

        for username in self.developers.keys() {
            let commits: Vec<&Commit> = self.commits.iter().filter(|c| &c.author == username).collect();
            match Baseline::from_commits(BaselineScope::Developer(username.clone()), commits.iter().copied()) {
                Ok(baseline) => {
                    self.developer_baselines.insert(username.clone(), baseline);
                }
                Err(e) => debug!("{}", e),
            }
            self.daily.extend(compute_daily_stats(username, commits));
        }

        self.repo_baseline = match Baseline::from_commits(BaselineScope::Repository, &self.commits) {
            Ok(baseline) => Some(baseline),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        self.stale_developers.clear();
        self.repo_stale = false;
        info!(
            "Recomputed baselines for {} developers over {} commits ({} daily rows)",
            self.developer_baselines.len(),
            self.commits.len(),
            self.daily.len()
        );
    }
}

impl HistoryStore for MemoryStore {
    fn developer(&self, username: &str) -> Option<&Developer> {
        self.developers.get(username)
    }

    fn commits_by(&self, username: &str) -> Vec<&Commit> {
        let mut commits: Vec<&Commit> = self.commits.iter().filter(|c| c.author == username).collect();
        commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        commits
    }

    fn files(&self, filter: FileFilter<'_>) -> Vec<&File> {
        match filter {
            FileFilter::All => self.files.iter().collect(),
            FileFilter::OwnedBy(username) => self
                .files
                .iter()
                .filter(|f| f.owner.as_deref() == Some(username))
                .collect(),
            FileFilter::TouchedBy(username) => {
                let touched: BTreeSet<&str> = self
                    .commits
                    .iter()
                    .filter(|c| c.author == username)
                    .flat_map(|c| c.files.iter().map(|f| f.path.as_str()))
                    .collect();
                self.files
                    .iter()
                    .filter(|f| touched.contains(f.path.as_str()))
                    .collect()
            }
        }
    }

    fn baseline(&self, scope: &BaselineScope) -> EngineResult<&Baseline> {
        let insufficient = || EngineError::InsufficientData {
            scope: scope.to_string(),
        };
        match scope {
            BaselineScope::Developer(username) => {
                if self.stale_developers.contains(username) {
                    return Err(EngineError::StaleBaseline {
                        scope: scope.to_string(),
                    });
                }
                self.developer_baselines.get(username).ok_or_else(insufficient)
            }
            BaselineScope::Repository => {
                if self.repo_stale {
                    return Err(EngineError::StaleBaseline {
                        scope: scope.to_string(),
                    });
                }
                self.repo_baseline.as_ref().ok_or_else(insufficient)
            }
        }
    }

    fn total_commits(&self) -> usize {
        self.commits.len()
    }

    fn daily_stats_on(&self, day: NaiveDate) -> Vec<&DailyCommitStats> {
        self.daily.iter().filter(|d| d.day == day).collect()
    }

    fn daily_history(&self, username: &str) -> Vec<&DailyCommitStats> {
        self.daily.iter().filter(|d| d.developer == username).collect()
    }

    fn pull_requests(&self, username: &str) -> Vec<&PullRequest> {
        self.pulls.iter().filter(|p| p.author == username).collect()
    }
}
