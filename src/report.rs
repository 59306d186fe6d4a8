//! Score reports
//!
//! Supports two output formats:
//! - `text` - the plain report written per scored commit
//! - `json` - machine-readable JSON

use crate::anomaly::Classification;
use crate::engine::Verdict;
use crate::models::{CommitPayload, FileCounts};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateResult {
    pub name: &'static str,
    pub value: bool,
}

fn predicate_list<const N: usize>(predicates: [(&'static str, bool); N]) -> Vec<PredicateResult> {
    predicates
        .into_iter()
        .map(|(name, value)| PredicateResult { name, value })
        .collect()
}

/// Everything reported for one scored commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub username: String,
    pub commit_id: String,
    pub url: String,
    pub authored_at: String,
    pub author_name: String,
    pub message: String,
    pub files: FileCounts,
    pub violation_percent: f64,
    pub trusted: bool,
    pub trust_score: f64,
    /// Rule predicates; `true` means violated
    pub rules: Vec<PredicateResult>,
    /// Trust predicates; `true` means satisfied
    pub trust: Vec<PredicateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<Classification>,
}

impl ScoreReport {
    pub fn new(payload: &CommitPayload, verdict: &Verdict) -> Self {
        Self {
            username: payload.username().to_string(),
            commit_id: payload.sha.clone(),
            url: payload.url.clone(),
            authored_at: payload.timestamp().to_rfc3339(),
            author_name: payload.commit.author.name.clone(),
            message: payload.commit.message.clone(),
            files: payload.file_counts(),
            violation_percent: verdict.violation_percent,
            trusted: verdict.trusted,
            trust_score: verdict.rules.trust.score,
            rules: predicate_list(verdict.rules.predicates()),
            trust: predicate_list(verdict.rules.trust.predicates()),
            anomaly: None,
        }
    }

    pub fn with_anomaly(mut self, classification: Classification) -> Self {
        self.anomaly = Some(classification);
        self
    }

    /// File name the text report is written under
    pub fn file_name(&self) -> String {
        format!("report_{}_{}", self.username, self.commit_id)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Commit: {}\n", self.commit_id);
        if !self.url.is_empty() {
            let _ = writeln!(out, "URL: {}\n", self.url);
        }
        let _ = writeln!(out, "Authored on {} by {}", self.authored_at, self.author_name);
        let _ = writeln!(out, "Commit Message: {}\n", self.message.trim_end());
        let _ = writeln!(out, "This commit added {} files.", self.files.added);
        let _ = writeln!(out, "This commit modified {} files.", self.files.modified);
        let _ = writeln!(out, "This commit removed {} files.\n", self.files.removed);
        let _ = writeln!(
            out,
            "{} is {} (trust score {:.1})\n",
            self.username,
            if self.trusted { "TRUSTED" } else { "NOT TRUSTED" },
            self.trust_score
        );
        let _ = writeln!(out, "This commit violated {:.2}% of the rules.", self.violation_percent);
        for rule in self.rules.iter().filter(|r| r.value) {
            let _ = writeln!(out, "  - {}", rule.name);
        }
        if let Some(anomaly) = self.anomaly {
            let _ = writeln!(out, "\nBehavior: {}", anomaly);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::ScoringEngine;
    use crate::models::{CommitDetail, CommitStatsPayload, FilePayload, FileStatus, Signature};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn report() -> ScoreReport {
        let payload = CommitPayload {
            sha: "deadbeef".into(),
            url: "https://example.com/c/deadbeef".into(),
            commit: CommitDetail {
                author: Signature {
                    name: "Mallory".into(),
                    email: "mallory@example.com".into(),
                    date: Utc.with_ymd_and_hms(2024, 2, 2, 3, 4, 5).unwrap(),
                },
                message: "Update deploy script\n".into(),
            },
            author: None,
            stats: CommitStatsPayload { additions: 1, deletions: 0, total: 1 },
            files: vec![FilePayload {
                filename: "deploy.sh".into(),
                status: FileStatus::Added,
                additions: 1,
                deletions: 0,
                patch: None,
                previous_filename: None,
            }],
        };
        let engine = ScoringEngine::new(MemoryStore::new(), EngineConfig::default()).unwrap();
        let verdict = engine.evaluate_payload(&payload).unwrap();
        ScoreReport::new(&payload, &verdict)
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("TEXT").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_text_report_lines() {
        let text = report().render(OutputFormat::Text).unwrap();
        assert!(text.starts_with("Commit: deadbeef\n"));
        assert!(text.contains("This commit added 1 files."));
        assert!(text.contains("mallory@example.com is NOT TRUSTED"));
        assert!(text.contains("This commit violated 28.57% of the rules."));
        assert!(text.contains("  - sensitive_files"));
        assert!(text.contains("  - untrusted"));
    }

    #[test]
    fn test_json_report() {
        let report = report().with_anomaly(Classification::Anomalous);
        let json = report.render(OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["commit_id"], "deadbeef");
        assert_eq!(parsed["trusted"], false);
        assert_eq!(parsed["anomaly"], "anomalous");
        assert_eq!(parsed["rules"].as_array().unwrap().len(), 6);
        assert_eq!(parsed["trust"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(report().file_name(), "report_mallory@example.com_deadbeef");
    }
}
