//! Deterministic rule evaluation
//!
//! Every commit is checked against a fixed set of boolean predicates about
//! what it touches and who wrote it. The violation score is the share of
//! predicates that fired, always expressed over [`RULE_DENOMINATOR`] so scores
//! stay comparable with historical reports.
//!
//! Author trust lives in [`trust`] and feeds the last predicate.

pub mod trust;

pub use trust::{TrustEvaluator, TrustOutcome, TRUST_PREDICATES};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::models::{file_extension, CommitPayload};
use crate::stats::primitives::round_half_even;
use crate::stats::{Observation, OutlierDetector, OutlierVerdict};
use crate::store::{FileFilter, HistoryStore};
use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Fixed divisor of the violation score
pub const RULE_DENOMINATOR: f64 = 7.0;

/// Commit-level input to the rule evaluator
#[derive(Debug, Clone)]
pub struct RuleInput<'p> {
    pub payload: &'p CommitPayload,
    pub author: &'p str,
    /// Files the commit adds
    pub added_files: &'p [String],
    /// This commit's modified and removed files
    pub touched_files: &'p BTreeSet<String>,
    pub day: NaiveDate,
}

impl<'p> RuleInput<'p> {
    fn sensitive_candidates(&self) -> BTreeSet<&'p str> {
        self.touched_files
            .iter()
            .map(String::as_str)
            .chain(self.added_files.iter().map(String::as_str))
            .collect()
    }
}

/// Outcome of every rule predicate for one commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub sensitive_files: bool,
    pub stale_familiarity: bool,
    pub majority_ownership: bool,
    pub adds_outside_territory: bool,
    pub outlier: bool,
    pub untrusted: bool,
    pub outlier_detail: OutlierVerdict,
    pub trust: TrustOutcome,
    /// Fired predicates / 7 * 100
    pub violation_percent: f64,
}

impl RuleOutcome {
    pub fn predicates(&self) -> [(&'static str, bool); 6] {
        [
            ("sensitive_files", self.sensitive_files),
            ("stale_familiarity", self.stale_familiarity),
            ("majority_ownership", self.majority_ownership),
            ("adds_outside_territory", self.adds_outside_territory),
            ("outlier", self.outlier),
            ("untrusted", self.untrusted),
        ]
    }

    pub fn violations(&self) -> usize {
        self.predicates().iter().filter(|(_, fired)| *fired).count()
    }
}

pub struct RuleEvaluator<'a, S: HistoryStore + ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: HistoryStore + ?Sized> RuleEvaluator<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate all predicates for one commit.
    ///
    /// Fails only when a baseline the outlier check needs is stale.
    pub fn evaluate(&self, input: &RuleInput<'_>) -> EngineResult<RuleOutcome> {
        let first_commit = self.store.is_first_commit(input.author);

        let sensitive_files = self.touches_sensitive_files(input);
        let stale_familiarity = !first_commit && self.is_stale_familiarity(input);
        let majority_ownership = !first_commit && self.owns_majority(input);
        let adds_outside_territory = self.adds_outside_territory(input);

        let observation = Observation::from_payload(input.payload);
        let outlier_detail = OutlierDetector::new(self.store).check(input.author, &observation)?;
        let outlier = outlier_detail.is_outlier();

        let trust = TrustEvaluator::new(self.store, &self.config.trust).evaluate(input.author, input.day);

        let mut outcome = RuleOutcome {
            sensitive_files,
            stale_familiarity,
            majority_ownership,
            adds_outside_territory,
            outlier,
            untrusted: !trust.trusted,
            outlier_detail,
            trust,
            violation_percent: 0.0,
        };
        outcome.violation_percent = outcome.violations() as f64 / RULE_DENOMINATOR * 100.0;

        info!(
            "Scored commit {} by {}: {:.1}% violations, trusted={}",
            input.payload.sha, input.author, outcome.violation_percent, trust.trusted
        );
        Ok(outcome)
    }

    fn touches_sensitive_files(&self, input: &RuleInput<'_>) -> bool {
        let count = input
            .sensitive_candidates()
            .into_iter()
            .filter(|path| self.config.is_sensitive_extension(file_extension(path)))
            .count();
        debug!("{} sensitive files touched", count);
        count >= self.config.rules.sensitive_files_threshold
    }

    fn is_stale_familiarity(&self, input: &RuleInput<'_>) -> bool {
        let previously_touched: FxHashSet<&str> = self
            .store
            .files(FileFilter::TouchedBy(input.author))
            .into_iter()
            .map(|f| f.path.as_str())
            .collect();
        let touched: FxHashSet<&str> = input.touched_files.iter().map(String::as_str).collect();

        // Historical overlap minus the current set: empty whenever the overlap
        // is drawn from `touched` itself, kept for score compatibility
        let overlap: FxHashSet<&str> = previously_touched.intersection(&touched).copied().collect();
        let unfamiliar = overlap.difference(&touched).count();

        let share = if touched.is_empty() {
            0.0
        } else {
            round_half_even(unfamiliar as f64 / touched.len() as f64, 2)
        };
        share >= self.config.rules.not_touched_files
    }

    fn owns_majority(&self, input: &RuleInput<'_>) -> bool {
        let total_files = self.store.files(FileFilter::All).len();
        if total_files == 0 {
            return false;
        }
        let owned = self
            .store
            .files(FileFilter::OwnedBy(input.author))
            .into_iter()
            .filter(|f| input.touched_files.contains(&f.path))
            .count();
        round_half_even(owned as f64 / total_files as f64, 2) >= self.config.rules.owned_majority_files
    }

    /// Files where the author's accumulated changed lines reach the threshold
    fn major_contributions(&self, author: &str) -> FxHashSet<String> {
        let mut lines_per_file: FxHashMap<&str, u64> = FxHashMap::default();
        for commit in self.store.commits_by(author) {
            for change in &commit.files {
                *lines_per_file.entry(change.path.as_str()).or_insert(0) += commit.changed_lines();
            }
        }
        lines_per_file
            .into_iter()
            .filter(|(_, lines)| *lines >= self.config.rules.contributions)
            .map(|(path, _)| path.to_string())
            .collect()
    }

    fn adds_outside_territory(&self, input: &RuleInput<'_>) -> bool {
        if (input.added_files.len() as f64) < self.config.rules.new_files_outlier {
            return false;
        }
        let major = self.major_contributions(input.author);
        !input.touched_files.iter().any(|path| major.contains(path))
    }
}
