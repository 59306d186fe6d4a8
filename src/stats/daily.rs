//! Per-developer daily commit statistics
//!
//! One row per (developer, calendar day). Rows are computed in batch from the
//! commit history and serve as the anomaly model's training set.

use super::primitives::Summary;
use crate::features::{BatchSummary, FeatureVector};
use crate::models::Commit;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregates of one developer's commits on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCommitStats {
    pub developer: String,
    pub day: NaiveDate,
    pub commit_count: usize,
    pub first_commit_at: DateTime<Utc>,
    pub last_commit_at: DateTime<Utc>,
    pub intervals: Summary,
    pub changed_lines: Summary,
    pub changed_chars: Summary,
    pub message_len: Summary,
    pub added_files: Summary,
    pub modified_files: Summary,
    pub removed_files: Summary,
}

impl DailyCommitStats {
    fn from_day(developer: &str, day: NaiveDate, mut commits: Vec<&Commit>) -> Option<Self> {
        // Most recent first, so intervals come out non-negative
        commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let last_commit_at = commits.first()?.timestamp;
        let first_commit_at = commits.last()?.timestamp;
        let summary = BatchSummary::from_records(&commits);

        Some(Self {
            developer: developer.to_string(),
            day,
            commit_count: summary.commit_count,
            first_commit_at,
            last_commit_at,
            intervals: summary.intervals,
            changed_lines: summary.changed_lines,
            changed_chars: summary.changed_chars,
            message_len: summary.message_len,
            added_files: summary.added_files,
            modified_files: summary.modified_files,
            removed_files: summary.removed_files,
        })
    }

    /// Training row for the anomaly model
    pub fn feature_vector(&self) -> FeatureVector {
        let summary = BatchSummary {
            commit_count: self.commit_count,
            intervals: self.intervals,
            changed_lines: self.changed_lines,
            changed_chars: self.changed_chars,
            message_len: self.message_len,
            added_files: self.added_files,
            modified_files: self.modified_files,
            removed_files: self.removed_files,
        };
        FeatureVector::from_summary(&summary).rounded()
    }
}

/// Daily rows for one developer's commits, oldest day first.
pub fn compute_daily_stats<'a, I>(developer: &str, commits: I) -> Vec<DailyCommitStats>
where
    I: IntoIterator<Item = &'a Commit>,
{
    let mut by_day: BTreeMap<NaiveDate, Vec<&Commit>> = BTreeMap::new();
    for commit in commits {
        by_day.entry(commit.day).or_default().push(commit);
    }

    by_day
        .into_iter()
        .filter_map(|(day, commits)| DailyCommitStats::from_day(developer, day, commits))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(ts: DateTime<Utc>, added: u64, message: &str) -> Commit {
        Commit {
            id: ts.to_rfc3339(),
            author: "dev".into(),
            timestamp: ts,
            day: ts.date_naive(),
            message: message.into(),
            lines_added: added,
            lines_removed: 0,
            changed_chars: added * 10,
            added_files: 1,
            modified_files: 0,
            removed_files: 0,
            renamed_files: 0,
            languages: Default::default(),
            files: vec![],
        }
    }

    #[test]
    fn test_groups_by_day() {
        let commits = vec![
            commit(Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap(), 10, "a"),
            commit(Utc.with_ymd_and_hms(2023, 3, 1, 10, 0, 0).unwrap(), 20, "bb"),
            commit(Utc.with_ymd_and_hms(2023, 3, 2, 8, 0, 0).unwrap(), 5, "ccc"),
        ];
        let rows = compute_daily_stats("dev", &commits);
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.day, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(first.commit_count, 2);
        assert_eq!(first.intervals.mean, 3600.0);
        assert_eq!(first.changed_lines.min, 10.0);
        assert_eq!(first.changed_lines.max, 20.0);
        assert_eq!(first.changed_lines.variance, 50.0);
        assert_eq!(first.first_commit_at.to_rfc3339(), "2023-03-01T09:00:00+00:00");

        let second = &rows[1];
        assert_eq!(second.commit_count, 1);
        assert_eq!(second.intervals.mean, 0.0);
        assert_eq!(second.changed_lines.variance, 0.0);
    }

    #[test]
    fn test_feature_vector_from_row() {
        let commits = vec![
            commit(Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap(), 10, "a"),
            commit(Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 7).unwrap(), 11, "bb"),
        ];
        let rows = compute_daily_stats("dev", &commits);
        let fv = rows[0].feature_vector();
        assert_eq!(fv.commit_count, 2.0);
        assert_eq!(fv.interval_mean, 7.0);
        assert_eq!(fv.changed_lines_mean, 11.0); // 10.5 rounds away from zero
        assert_eq!(fv.changed_chars_mean, 105.0);
        assert_eq!(fv.added_files_mean, 1.0);
    }
}
