//! CLI command definitions and handlers

mod classify;
mod ingest;
mod init;
mod score;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commitguard::models::CommitPayload;
use commitguard::store::MemoryStore;
use commitguard::{load_engine_config, ScoringEngine};
use std::path::{Path, PathBuf};

/// Commitguard - commit trust and anomaly scoring
#[derive(Parser, Debug)]
#[command(name = "commitguard")]
#[command(
    version,
    about = "Score commits for trust and behavioral anomaly",
    after_help = "\
Examples:
  commitguard init                                   Write a default commitguard.toml
  commitguard ingest . -o snapshot.json              Build a history snapshot from local git
  commitguard score payload.json -s snapshot.json    Score one commit payload
  commitguard classify payload.json -s snapshot.json Normal/anomalous for one commit"
)]
pub struct Cli {
    /// Directory holding commitguard.toml (default: current directory)
    #[arg(long, short = 'C', global = true, env = "COMMITGUARD_CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a commitguard.toml with the default thresholds
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Walk local git history and write a history snapshot
    Ingest {
        /// Repository path
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Snapshot file to write
        #[arg(long, short = 'o', default_value = "commitguard-snapshot.json")]
        output: PathBuf,

        /// Most recent commits to ingest
        #[arg(long, default_value = "10000")]
        max_commits: usize,
    },

    /// Score one commit payload (API-shaped JSON) against a snapshot
    Score {
        /// Commit payload file
        payload: PathBuf,

        /// History snapshot written by `ingest`
        #[arg(long, short = 's')]
        snapshot: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Also classify the commit with the author's anomaly model
        #[arg(long)]
        anomaly: bool,

        /// Write the report to report_<user>_<commit> in this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Classify one commit payload as normal or anomalous for its author
    Classify {
        /// Commit payload file
        payload: PathBuf,

        /// History snapshot written by `ingest`
        #[arg(long, short = 's')]
        snapshot: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => init::run(&cli.config_dir, force),
        Commands::Ingest {
            repo,
            output,
            max_commits,
        } => ingest::run(&repo, &output, max_commits),
        Commands::Score {
            payload,
            snapshot,
            format,
            anomaly,
            output_dir,
        } => score::run(
            &cli.config_dir,
            &payload,
            &snapshot,
            &format,
            anomaly,
            output_dir.as_deref(),
        ),
        Commands::Classify { payload, snapshot } => classify::run(&cli.config_dir, &payload, &snapshot),
    }
}

fn load_payload(path: &Path) -> Result<CommitPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid commit payload in {}", path.display()))
}

/// Engine over a snapshot, with baselines recomputed if the snapshot is stale
fn load_engine(config_dir: &Path, snapshot: &Path) -> Result<ScoringEngine<MemoryStore>> {
    let mut store = MemoryStore::load(snapshot)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    if store.is_stale() {
        store.recompute();
    }
    let config = load_engine_config(config_dir);
    ScoringEngine::new(store, config).context("Invalid engine configuration")
}
