//! Shared fixtures: scratch git repositories and commit payloads

#![allow(dead_code)]

use commitguard::models::{
    CommitDetail, CommitPayload, CommitStatsPayload, FilePayload, FileStatus, Signature,
};
use chrono::{TimeZone, Utc};
use git2::Repository;
use std::path::Path;
use tempfile::TempDir;

pub const ANA: &str = "ana@example.com";
pub const BOB: &str = "bob@example.com";

/// Scratch repository with deterministic commit times
pub struct ScratchRepo {
    pub dir: TempDir,
    repo: Repository,
}

impl ScratchRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = Repository::init(dir.path()).expect("init repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write files and commit them as `email` at `unix_seconds`
    pub fn commit(&self, email: &str, unix_seconds: i64, writes: &[(&str, String)]) {
        let mut index = self.repo.index().expect("index");
        for (path, content) in writes {
            let full = self.dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).expect("create dirs");
            }
            std::fs::write(&full, content).expect("write file");
            index.add_path(Path::new(path)).expect("stage file");
        }
        index.write().expect("write index");
        let tree = self
            .repo
            .find_tree(index.write_tree().expect("write tree"))
            .expect("find tree");

        let when = git2::Time::new(unix_seconds, 0);
        let sig = git2::Signature::new("Dev", email, &when).expect("signature");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, &format!("update at {}", unix_seconds), &tree, &parents)
            .expect("commit");
    }
}

/// Ten days of regular work by Ana on `src/`, a couple of commits by Bob on `docs/`
pub fn team_repo() -> ScratchRepo {
    let repo = ScratchRepo::new();
    let start = 1_672_560_000; // 2023-01-01T08:00:00Z
    let day = 86_400;

    for d in 0..10i64 {
        for c in 0..3i64 {
            let t = start + d * day + c * 2 * 3600;
            let lines: String = (0..(5 + c + d % 3)).map(|i| format!("line {} {} {}\n", d, c, i)).collect();
            repo.commit(ANA, t, &[("src/core.rs", lines.clone()), (&format!("src/mod_{}.rs", c), lines)]);
        }
    }
    for d in 0..2i64 {
        let t = start + d * day + 5 * 3600;
        repo.commit(BOB, t, &[("docs/guide.md", format!("guide rev {}\n", d))]);
    }
    repo
}

/// API-shaped payload for a commit that did not go through git
pub fn payload(sha: &str, email: &str, date: (i32, u32, u32), files: &[(&str, FileStatus)]) -> CommitPayload {
    CommitPayload {
        sha: sha.to_string(),
        url: format!("https://example.com/commit/{}", sha),
        commit: CommitDetail {
            author: Signature {
                name: "Someone".to_string(),
                email: email.to_string(),
                date: Utc
                    .with_ymd_and_hms(date.0, date.1, date.2, 12, 0, 0)
                    .single()
                    .expect("valid date"),
            },
            message: "Routine change".to_string(),
        },
        author: None,
        stats: CommitStatsPayload {
            additions: 6,
            deletions: 6,
            total: 12,
        },
        files: files
            .iter()
            .map(|(name, status)| FilePayload {
                filename: name.to_string(),
                status: *status,
                additions: 6,
                deletions: 6,
                patch: Some("@@ -1 +1 @@\n-old line\n+new line".to_string()),
                previous_filename: None,
            })
            .collect(),
    }
}
