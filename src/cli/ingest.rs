//! Ingest command - local git history to snapshot

use anyhow::{bail, Context, Result};
use commitguard::git::{ingest_payloads, GitHistory};
use commitguard::store::MemoryStore;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

fn create_bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("█▓▒░  "))
}

pub fn run(repo: &Path, output: &Path, max_commits: usize) -> Result<()> {
    let start = Instant::now();
    if !GitHistory::is_git_repo(repo) {
        bail!("{} is not inside a git repository", repo.display());
    }
    let history = GitHistory::open(repo)
        .with_context(|| format!("Failed to open git repository at {}", repo.display()))?;
    let payloads = history
        .commit_payloads(max_commits)
        .with_context(|| format!("Failed to read history of {}", repo.display()))?;

    let bar = ProgressBar::new(payloads.len() as u64);
    bar.set_style(create_bar_style()?);
    bar.set_message("Ingesting commits...");

    let mut store = MemoryStore::new();
    let stored = ingest_payloads(&mut store, &payloads, |_| bar.inc(1))?;
    bar.finish_and_clear();

    store.recompute();
    store
        .save(output)
        .with_context(|| format!("Failed to write snapshot {}", output.display()))?;

    println!(
        "{} Ingested {} commits from {} developers in {:.1}s",
        style("✓").green(),
        stored,
        store.developers().count(),
        start.elapsed().as_secs_f64()
    );
    println!("{} Snapshot written to {}", style("✓").green(), style(output.display()).cyan());
    Ok(())
}
