//! Commit history extraction using libgit2
//!
//! Walks a local repository and turns every commit into the same
//! [`CommitPayload`] shape the hosting service returns, so local history and
//! webhook payloads go through one ingestion path.

use crate::error::EngineResult;
use crate::models::{
    CommitDetail, CommitPayload, CommitStatsPayload, Developer, FilePayload, FileStatus, Signature,
};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Delta, DiffFindOptions, Patch, Repository, Sort};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Git history reader using libgit2.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open a git repository.
    ///
    /// # Arguments
    /// * `path` - Path to the repository (or any subdirectory)
    pub fn open(path: &Path) -> EngineResult<Self> {
        let repo = Repository::discover(path)?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Check if a path is inside a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// The most recent `max_commits` commits reachable from HEAD, oldest first.
    pub fn commit_payloads(&self, max_commits: usize) -> EngineResult<Vec<CommitPayload>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;

        let mut payloads = Vec::new();
        for oid_result in revwalk.take(max_commits) {
            let commit = self.repo.find_commit(oid_result?)?;
            payloads.push(self.commit_payload(&commit)?);
        }
        payloads.reverse();

        debug!("Extracted {} commits", payloads.len());
        Ok(payloads)
    }

    fn commit_payload(&self, commit: &git2::Commit) -> EngineResult<CommitPayload> {
        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        let mut files = Vec::new();
        for idx in 0..diff.deltas().len() {
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            let status = file_status(delta.status());
            let new_path = delta.new_file().path().map(|p| p.to_string_lossy().to_string());
            let old_path = delta.old_file().path().map(|p| p.to_string_lossy().to_string());
            let filename = match status {
                FileStatus::Removed => old_path.clone(),
                _ => new_path.or_else(|| old_path.clone()),
            };
            let Some(filename) = filename else {
                continue;
            };

            let (additions, deletions, patch) = match Patch::from_diff(&diff, idx)? {
                Some(mut patch) => {
                    let (_, additions, deletions) = patch.line_stats()?;
                    (additions as u64, deletions as u64, hunk_text(&mut patch)?)
                }
                None => (0, 0, None),
            };

            files.push(FilePayload {
                filename,
                status,
                additions,
                deletions,
                patch,
                previous_filename: if status == FileStatus::Renamed { old_path } else { None },
            });
        }

        let stats = diff.stats()?;
        let author = commit.author();

        Ok(CommitPayload {
            sha: commit.id().to_string(),
            url: String::new(),
            commit: CommitDetail {
                author: Signature {
                    name: author.name().unwrap_or("Unknown").to_string(),
                    email: author.email().unwrap_or("").to_string(),
                    date: git_time(&author.when()),
                },
                message: commit.message().unwrap_or("").to_string(),
            },
            author: None,
            stats: CommitStatsPayload {
                additions: stats.insertions() as u64,
                deletions: stats.deletions() as u64,
                total: (stats.insertions() + stats.deletions()) as u64,
            },
            files,
        })
    }
}

/// Hunks of a file patch without the file header, as the hosting API returns them.
/// `None` for binary files.
fn hunk_text(patch: &mut Patch) -> EngineResult<Option<String>> {
    if patch.delta().flags().is_binary() {
        return Ok(None);
    }
    let mut text = String::new();
    patch.print(&mut |_, _, line| {
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            'H' => text.push_str(&content),
            origin @ ('+' | '-' | ' ') => {
                text.push(origin);
                text.push_str(&content);
            }
            _ => {}
        }
        true
    })?;
    Ok(Some(text))
}

fn file_status(delta: Delta) -> FileStatus {
    match delta {
        Delta::Added | Delta::Untracked => FileStatus::Added,
        Delta::Deleted => FileStatus::Removed,
        Delta::Modified => FileStatus::Modified,
        Delta::Renamed => FileStatus::Renamed,
        Delta::Copied => FileStatus::Copied,
        Delta::Unmodified => FileStatus::Unchanged,
        _ => FileStatus::Changed,
    }
}

fn git_time(time: &git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// One developer record per commit author.
///
/// The contribution count is the author's commit count and the account is
/// dated to the author's first commit.
pub fn developers_from_payloads(payloads: &[CommitPayload]) -> Vec<Developer> {
    let mut developers: BTreeMap<&str, Developer> = BTreeMap::new();
    for payload in payloads {
        let username = payload.username();
        let timestamp = payload.timestamp();
        let dev = developers.entry(username).or_insert_with(|| Developer {
            username: username.to_string(),
            contributions: 0,
            account_created: timestamp,
            followers: 0,
        });
        dev.contributions += 1;
        dev.account_created = dev.account_created.min(timestamp);
    }
    developers.into_values().collect()
}
