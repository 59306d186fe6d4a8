//! Author trust predicates
//!
//! Six independent checks of an author's standing. The trust score is the
//! share of satisfied checks rounded to one decimal; the author is trusted
//! when it reaches `trust.trust_threshold`.

use crate::config::TrustConfig;
use crate::stats::primitives::{ratio, round_half_even};
use crate::store::HistoryStore;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

pub const TRUST_PREDICATES: usize = 6;

/// Outcome of every trust predicate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrustOutcome {
    /// Has a non-zero public contribution count
    pub external_contributor: bool,
    /// Account older than the configured minimum age, or no account record
    pub established_account: bool,
    /// Share of all repository commits reaches the threshold
    pub commit_share: bool,
    /// A developer record existed before this evaluation
    pub returning_author: bool,
    /// Share of the day's commits reaches the threshold
    pub same_day_share: bool,
    /// Rejected pull request ratio at or below the threshold
    pub pull_requests_accepted: bool,
    /// round(satisfied / 6, 1)
    pub score: f64,
    pub trusted: bool,
}

impl TrustOutcome {
    pub fn predicates(&self) -> [(&'static str, bool); TRUST_PREDICATES] {
        [
            ("external_contributor", self.external_contributor),
            ("established_account", self.established_account),
            ("commit_share", self.commit_share),
            ("returning_author", self.returning_author),
            ("same_day_share", self.same_day_share),
            ("pull_requests_accepted", self.pull_requests_accepted),
        ]
    }

    pub fn satisfied(&self) -> usize {
        self.predicates().iter().filter(|(_, ok)| *ok).count()
    }
}

/// Evaluates the trust predicates against a history store.
pub struct TrustEvaluator<'a, S: HistoryStore + ?Sized> {
    store: &'a S,
    config: &'a TrustConfig,
}

impl<'a, S: HistoryStore + ?Sized> TrustEvaluator<'a, S> {
    pub fn new(store: &'a S, config: &'a TrustConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate `username` as of `day`
    pub fn evaluate(&self, username: &str, day: NaiveDate) -> TrustOutcome {
        let mut outcome = TrustOutcome {
            external_contributor: self.is_external_contributor(username),
            established_account: self.has_established_account(username, day),
            commit_share: self.meets_commit_share(username),
            returning_author: !self.store.is_first_commit(username),
            same_day_share: self.meets_same_day_share(username, day),
            pull_requests_accepted: self.pull_requests_accepted(username),
            score: 0.0,
            trusted: false,
        };

        outcome.score = round_half_even(outcome.satisfied() as f64 / TRUST_PREDICATES as f64, 1);
        outcome.trusted = outcome.score >= self.config.trust_threshold;
        debug!(
            "Trust for {} on {}: score {} ({}/{})",
            username,
            day,
            outcome.score,
            outcome.satisfied(),
            TRUST_PREDICATES
        );
        outcome
    }

    fn is_external_contributor(&self, username: &str) -> bool {
        self.store.external_contributions(username).unwrap_or(0) != 0
    }

    /// Only a known account can be too recent; an absent record passes
    fn has_established_account(&self, username: &str, day: NaiveDate) -> bool {
        match self.store.developer(username) {
            Some(dev) => {
                let age_days = (day - dev.account_created.date_naive()).num_days();
                age_days > self.config.min_account_age_days
            }
            None => true,
        }
    }

    fn meets_commit_share(&self, username: &str) -> bool {
        let own = self.store.commits_by(username).len();
        match ratio(own, self.store.total_commits()) {
            Some(share) => round_half_even(share, 2) >= self.config.few_commits_threshold,
            None => false,
        }
    }

    fn meets_same_day_share(&self, username: &str, day: NaiveDate) -> bool {
        let rows = self.store.daily_stats_on(day);
        let total: usize = rows.iter().map(|r| r.commit_count).sum();
        let Some(own) = rows.iter().find(|r| r.developer == username) else {
            return false;
        };
        match ratio(own.commit_count, total) {
            Some(share) => round_half_even(share, 1) >= self.config.same_day_commits,
            None => false,
        }
    }

    fn pull_requests_accepted(&self, username: &str) -> bool {
        let pulls = self.store.pull_requests(username);
        let rejected = pulls.iter().filter(|p| p.is_rejected()).count();
        match ratio(rejected, pulls.len()) {
            // Rounded to a whole number: any ratio above one half counts as 1
            Some(rate) => round_half_even(rate, 0) <= self.config.rejected_pr,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CommitDetail, CommitPayload, CommitStatsPayload, Developer, PullRequest, PullState, Signature,
    };
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn store_with_pulls(total: u64, rejected: u64) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_developer(Developer {
            username: "ana".into(),
            contributions: 0,
            account_created: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            followers: 0,
        });
        for number in 0..total {
            store.add_pull_request(PullRequest {
                number,
                author: "ana".into(),
                state: PullState::Closed,
                merged: number >= rejected,
            });
        }
        store
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejected_pulls_round_to_integer() {
        let config = TrustConfig { rejected_pr: 0.5, ..Default::default() };

        // 6 of 10 rejected: round(0.6) = 1 > 0.5
        let store = store_with_pulls(10, 6);
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2024, 1, 1));
        assert!(!outcome.pull_requests_accepted);

        // 5 of 10 rejected: round(0.5) = 0 (ties to even)
        let store = store_with_pulls(10, 5);
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2024, 1, 1));
        assert!(outcome.pull_requests_accepted);

        // 4 of 10 rejected: round(0.4) = 0
        let store = store_with_pulls(10, 4);
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2024, 1, 1));
        assert!(outcome.pull_requests_accepted);
    }

    #[test]
    fn test_no_pulls_is_trusted_on_that_predicate() {
        let store = store_with_pulls(0, 0);
        let config = TrustConfig::default();
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2024, 1, 1));
        assert!(outcome.pull_requests_accepted);
    }

    #[test]
    fn test_account_age_is_measured_against_the_evaluated_day() {
        let store = store_with_pulls(0, 0);
        let config = TrustConfig { min_account_age_days: 30, ..Default::default() };
        let evaluator = TrustEvaluator::new(&store, &config);
        assert!(!evaluator.evaluate("ana", day(2023, 1, 31)).established_account);
        assert!(evaluator.evaluate("ana", day(2023, 2, 1)).established_account);
    }

    #[test]
    fn test_unknown_author() {
        let store = MemoryStore::new();
        let config = TrustConfig::default();
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ghost", day(2024, 1, 1));
        assert!(!outcome.external_contributor);
        assert!(outcome.established_account);
        assert!(!outcome.commit_share);
        assert!(!outcome.returning_author);
        assert!(!outcome.same_day_share);
        assert!(outcome.pull_requests_accepted);
        assert_eq!(outcome.satisfied(), 2);
        // 2/6 = 0.333.. rounds to 0.3
        assert_eq!(outcome.score, 0.3);
        assert!(!outcome.trusted);
    }

    #[test]
    fn test_score_steps_by_one_sixth() {
        let store = store_with_pulls(0, 0);
        let config = TrustConfig { min_account_age_days: 0, trust_threshold: 0.5, ..Default::default() };
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2024, 1, 1));
        // established + returning + pulls
        assert_eq!(outcome.satisfied(), 3);
        assert_eq!(outcome.score, 0.5);
        assert!(outcome.trusted);
    }

    fn developer(username: &str) -> Developer {
        Developer {
            username: username.into(),
            contributions: 1,
            account_created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            followers: 0,
        }
    }

    /// `own` commits by ana and `others` by bob, all on 2023-05-10
    fn same_day_store(own: i64, others: i64) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_developer(developer("ana"));
        store.add_developer(developer("bob"));
        let start = Utc.with_ymd_and_hms(2023, 5, 10, 1, 0, 0).unwrap();
        for i in 0..own + others {
            let author = if i < own { "ana" } else { "bob" };
            let payload = CommitPayload {
                sha: format!("c{}", i),
                url: String::new(),
                commit: CommitDetail {
                    author: Signature {
                        name: author.into(),
                        email: String::new(),
                        date: start + Duration::minutes(i * 10),
                    },
                    message: "change".into(),
                },
                author: None,
                stats: CommitStatsPayload::default(),
                files: vec![],
            };
            store.ingest_commit(author, &payload).unwrap();
        }
        store.recompute();
        store
    }

    #[test]
    fn test_same_day_share_rounds_exact_value() {
        let config = TrustConfig { same_day_commits: 0.5, ..Default::default() };

        // 9/20 = 0.45 is stored just above 0.45 and rounds to 0.5
        let store = same_day_store(9, 11);
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2023, 5, 10));
        assert!(outcome.same_day_share);

        // 7/20 = 0.35 is stored just below 0.35 and rounds to 0.3
        let store = same_day_store(7, 13);
        let config = TrustConfig { same_day_commits: 0.4, ..config };
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2023, 5, 10));
        assert!(!outcome.same_day_share);
    }

    #[test]
    fn test_commit_share_rounds_to_two_places() {
        // 3/40 = 0.075 is stored just below and rounds to 0.07
        let store = same_day_store(3, 37);
        let config = TrustConfig { few_commits_threshold: 0.08, ..Default::default() };
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2023, 5, 10));
        assert!(!outcome.commit_share);

        let config = TrustConfig { few_commits_threshold: 0.07, ..config };
        let outcome = TrustEvaluator::new(&store, &config).evaluate("ana", day(2023, 5, 10));
        assert!(outcome.commit_share);
    }
}
