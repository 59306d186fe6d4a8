//! Scoring engine
//!
//! [`ScoringEngine`] owns one evaluation session: the configuration loaded
//! for it, the history store it reads, and the registry of per-developer
//! anomaly models. Everything a caller needs goes through three operations:
//!
//! - [`ScoringEngine::evaluate`]: rule predicates and trust verdict for one commit
//! - [`ScoringEngine::train_anomaly_model`]: fit a developer's one-class model
//! - [`ScoringEngine::classify`]: normal/anomalous for one commit payload
//!
//! Baseline recompute and model training are write steps. They take `&mut`
//! access to the store or replace a registry entry, so they cannot interleave
//! with an evaluation borrowed from the same engine.

use crate::anomaly::{Classification, ModelHandle, ModelRegistry};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::models::{CommitPayload, FileStatus};
use crate::rules::{RuleEvaluator, RuleInput, RuleOutcome};
use crate::store::HistoryStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Result of scoring one commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    /// 0 to 100, a multiple of 100/7
    pub violation_percent: f64,
    pub trusted: bool,
    pub rules: RuleOutcome,
}

pub struct ScoringEngine<S: HistoryStore> {
    config: EngineConfig,
    store: S,
    registry: ModelRegistry,
    extractor: FeatureExtractor,
}

impl<S: HistoryStore> ScoringEngine<S> {
    /// Start a session. Fails if the configuration is out of range.
    pub fn new(store: S, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            registry: ModelRegistry::new(),
            extractor: FeatureExtractor::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access for ingestion and recompute between evaluations
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Score one commit with explicitly supplied file sets.
    pub fn evaluate(
        &self,
        payload: &CommitPayload,
        author: &str,
        added_files: &[String],
        touched_files: &BTreeSet<String>,
        day: NaiveDate,
    ) -> EngineResult<Verdict> {
        let input = RuleInput {
            payload,
            author,
            added_files,
            touched_files,
            day,
        };
        let rules = RuleEvaluator::new(&self.store, &self.config).evaluate(&input)?;
        Ok(Verdict {
            violation_percent: rules.violation_percent,
            trusted: rules.trust.trusted,
            rules,
        })
    }

    /// Score one commit, deriving author, file sets and day from the payload.
    ///
    /// Touched files are the commit's modified and removed files.
    pub fn evaluate_payload(&self, payload: &CommitPayload) -> EngineResult<Verdict> {
        let author = payload.username();
        let added = payload.files_with_status(FileStatus::Added);

        let touched: BTreeSet<String> = payload
            .files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Modified | FileStatus::Removed))
            .map(|f| f.filename.clone())
            .collect();
        debug!(
            "Commit {} by {}: {} added, {} touched",
            payload.sha,
            author,
            added.len(),
            touched.len()
        );

        self.evaluate(payload, author, &added, &touched, payload.day())
    }

    /// The developer's daily training vectors, oldest first
    pub fn training_vectors(&self, developer: &str) -> Vec<FeatureVector> {
        self.store
            .daily_history(developer)
            .into_iter()
            .map(|row| row.feature_vector())
            .collect()
    }

    /// Fit (or refit) the developer's anomaly model from their daily history.
    pub fn train_anomaly_model(&self, developer: &str) -> EngineResult<ModelHandle> {
        let vectors = self.training_vectors(developer);
        self.registry.train(developer, &vectors, &self.config.anomaly)
    }

    /// Fit models for several developers in parallel
    pub fn train_anomaly_models(&self, developers: &[&str]) -> Vec<(String, EngineResult<ModelHandle>)> {
        let histories: Vec<(String, Vec<FeatureVector>)> = developers
            .iter()
            .map(|dev| (dev.to_string(), self.training_vectors(dev)))
            .collect();
        let results = self.registry.train_all(&histories, &self.config.anomaly);
        info!(
            "Trained {} of {} anomaly models",
            results.iter().filter(|(_, r)| r.is_ok()).count(),
            results.len()
        );
        results
    }

    /// Classify one commit against the model behind `handle`.
    ///
    /// The handle must belong to the payload's author.
    pub fn classify(&self, handle: &ModelHandle, payload: &CommitPayload) -> EngineResult<Classification> {
        if handle.developer() != payload.username() {
            return Err(EngineError::InsufficientHistory {
                developer: payload.username().to_string(),
            });
        }
        let vector = self.extractor.extract_one(payload);
        self.registry.classify(handle, &vector)
    }

    /// Drop a developer's model, e.g. after their history changed
    pub fn evict_model(&self, developer: &str) -> bool {
        self.registry.evict(developer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnomalyConfig;
    use crate::models::{CommitDetail, CommitStatsPayload, Developer, FilePayload, Signature};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn payload(sha: &str, hours: i64, files: &[(&str, FileStatus)]) -> CommitPayload {
        CommitPayload {
            sha: sha.into(),
            url: String::new(),
            commit: CommitDetail {
                author: Signature {
                    name: "Ana".into(),
                    email: "ana@example.com".into(),
                    date: Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap() + Duration::hours(hours),
                },
                message: format!("commit {}", sha),
            },
            author: None,
            stats: CommitStatsPayload { additions: 5, deletions: 1, total: 6 },
            files: files
                .iter()
                .map(|(name, status)| FilePayload {
                    filename: name.to_string(),
                    status: *status,
                    additions: 5,
                    deletions: 1,
                    patch: Some("+added\n-removed".into()),
                    previous_filename: None,
                })
                .collect(),
        }
    }

    fn engine() -> ScoringEngine<MemoryStore> {
        let mut store = MemoryStore::new();
        store.add_developer(Developer {
            username: "ana@example.com".into(),
            contributions: 12,
            account_created: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            followers: 1,
        });
        for i in 0..12 {
            let p = payload(&format!("c{}", i), i * 20, &[("src/lib.rs", FileStatus::Modified)]);
            store.ingest_commit("ana@example.com", &p).unwrap();
        }
        store.recompute();
        ScoringEngine::new(store, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.anomaly = AnomalyConfig { nu: 0.0, ..Default::default() };
        assert!(ScoringEngine::new(MemoryStore::new(), config).is_err());
    }

    #[test]
    fn test_evaluate_payload_derives_inputs() {
        let engine = engine();
        let p = payload("new", 400, &[("src/lib.rs", FileStatus::Modified)]);
        let verdict = engine.evaluate_payload(&p).unwrap();
        assert_eq!(verdict.trusted, verdict.rules.trust.trusted);
        assert!(verdict.rules.trust.returning_author);
        assert!(!verdict.rules.outlier);
        assert!((0.0..=100.0).contains(&verdict.violation_percent));
    }

    #[test]
    fn test_train_and_classify() {
        let engine = engine();
        let handle = engine.train_anomaly_model("ana@example.com").unwrap();
        assert!(engine.registry().contains("ana@example.com"));

        let p = payload("new", 400, &[("src/lib.rs", FileStatus::Modified)]);
        assert!(engine.classify(&handle, &p).is_ok());
    }

    #[test]
    fn test_no_history_is_insufficient() {
        let engine = engine();
        let err = engine.train_anomaly_model("stranger").unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { .. }));

        let results = engine.train_anomaly_models(&["ana@example.com", "stranger"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[test]
    fn test_evicted_model_has_no_signal() {
        let engine = engine();
        let handle = engine.train_anomaly_model("ana@example.com").unwrap();
        assert!(engine.evict_model("ana@example.com"));
        let p = payload("new", 400, &[]);
        let err = engine.classify(&handle, &p).unwrap_err();
        assert!(err.is_insufficient());
    }
}
