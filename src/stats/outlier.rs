//! Statistical outlier detection
//!
//! A commit is an outlier for a scope when any tracked metric falls strictly
//! outside `[mean - stddev, mean + stddev]` of that scope's baseline. The
//! detector checks the author's own baseline (when the author has history)
//! and the repository baseline; either one tripping flags the commit.

use super::baseline::{Baseline, BaselineScope};
use crate::error::{EngineError, EngineResult};
use crate::models::{CommitPayload, FileCounts};
use crate::store::HistoryStore;
use serde::Serialize;
use tracing::debug;

/// Raw metrics of the commit under evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    pub additions: u64,
    pub deletions: u64,
    pub files: FileCounts,
}

impl Observation {
    pub fn from_payload(payload: &CommitPayload) -> Self {
        Self {
            additions: payload.stats.additions,
            deletions: payload.stats.deletions,
            files: payload.file_counts(),
        }
    }

    fn values(&self) -> [f64; 5] {
        [
            self.additions as f64,
            self.deletions as f64,
            self.files.added as f64,
            self.files.modified as f64,
            self.files.removed as f64,
        ]
    }
}

/// Names of the metrics for which `observation` leaves the baseline band
pub fn outlying_metrics(baseline: &Baseline, observation: &Observation) -> Vec<&'static str> {
    baseline
        .metrics()
        .iter()
        .zip(observation.values())
        .filter(|((_, stats), value)| stats.is_outside(*value))
        .map(|((name, _), _)| *name)
        .collect()
}

pub fn is_outlier(baseline: &Baseline, observation: &Observation) -> bool {
    baseline
        .metrics()
        .iter()
        .zip(observation.values())
        .any(|((_, stats), value)| stats.is_outside(value))
}

/// Outcome per scope; `None` when the scope had nothing to compare against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutlierVerdict {
    pub developer: Option<bool>,
    pub repository: Option<bool>,
}

impl OutlierVerdict {
    pub fn is_outlier(&self) -> bool {
        self.developer == Some(true) || self.repository == Some(true)
    }
}

/// Runs the two-scope outlier check against a history store.
pub struct OutlierDetector<'s, S: HistoryStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: HistoryStore + ?Sized> OutlierDetector<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Check `observation` for `username`.
    ///
    /// A scope without commits is vacuously not an outlier. A stale baseline
    /// is an error: the caller has to recompute first.
    pub fn check(&self, username: &str, observation: &Observation) -> EngineResult<OutlierVerdict> {
        let mut verdict = OutlierVerdict::default();

        if self.store.developer(username).is_some() {
            let scope = BaselineScope::Developer(username.to_string());
            verdict.developer = self.check_scope(&scope, observation)?;
        }
        verdict.repository = self.check_scope(&BaselineScope::Repository, observation)?;

        Ok(verdict)
    }

    fn check_scope(&self, scope: &BaselineScope, observation: &Observation) -> EngineResult<Option<bool>> {
        match self.store.baseline(scope) {
            Ok(baseline) => {
                let outlying = outlying_metrics(baseline, observation);
                if !outlying.is_empty() {
                    debug!("Outlier against {} baseline on {:?}", scope, outlying);
                }
                Ok(Some(!outlying.is_empty()))
            }
            Err(EngineError::InsufficientData { .. }) => {
                debug!("No {} baseline available, skipping outlier check", scope);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
