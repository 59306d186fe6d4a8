//! Local git history ingestion
//!
//! Builds a history store from a local repository instead of the hosting
//! service's API: commits become API-shaped payloads, authors become
//! developer records, and everything goes through
//! [`MemoryStore::ingest_commit`].
//!
//! # Example
//!
//! ```no_run
//! use commitguard::git::ingest_repository;
//! use std::path::Path;
//!
//! let store = ingest_repository(Path::new("/path/to/repo"), 1000).unwrap();
//! store.save(Path::new("snapshot.json")).unwrap();
//! ```

pub mod history;

pub use history::{developers_from_payloads, GitHistory};

use crate::error::EngineResult;
use crate::models::CommitPayload;
use crate::store::MemoryStore;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Register the payloads' authors and ingest every payload in order.
///
/// `on_commit` runs after each payload. Returns the number of newly stored commits.
pub fn ingest_payloads<F>(store: &mut MemoryStore, payloads: &[CommitPayload], mut on_commit: F) -> EngineResult<usize>
where
    F: FnMut(&CommitPayload),
{
    for developer in developers_from_payloads(payloads) {
        store.add_developer(developer);
    }

    let mut stored = 0;
    for payload in payloads {
        if store.ingest_commit(payload.username(), payload)? {
            stored += 1;
        }
        on_commit(payload);
    }
    Ok(stored)
}

/// Ingest up to `max_commits` of a repository's history and recompute baselines.
pub fn ingest_repository(path: &Path, max_commits: usize) -> Result<MemoryStore> {
    let history = GitHistory::open(path)
        .with_context(|| format!("Failed to open git repository at {}", path.display()))?;
    let payloads = history
        .commit_payloads(max_commits)
        .with_context(|| format!("Failed to read history of {}", path.display()))?;

    let mut store = MemoryStore::new();
    let stored = ingest_payloads(&mut store, &payloads, |_| {})?;
    store.recompute();

    info!("Ingested {} commits from {}", stored, path.display());
    Ok(store)
}
