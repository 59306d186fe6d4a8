//! Commit aggregation

use super::vector::FeatureVector;
use crate::models::{Commit, CommitPayload, FileCounts};
use crate::stats::Summary;
use chrono::{DateTime, Utc};

/// Anything the extractor can summarise: a raw API payload or a persisted commit.
pub trait CommitRecord {
    fn timestamp(&self) -> DateTime<Utc>;
    fn message_len(&self) -> usize;
    /// Lines added plus lines removed
    fn changed_lines(&self) -> u64;
    fn changed_chars(&self) -> u64;
    fn file_counts(&self) -> FileCounts;
}

impl CommitRecord for Commit {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn message_len(&self) -> usize {
        self.message.chars().count()
    }

    fn changed_lines(&self) -> u64 {
        Commit::changed_lines(self)
    }

    fn changed_chars(&self) -> u64 {
        self.changed_chars
    }

    fn file_counts(&self) -> FileCounts {
        Commit::file_counts(self)
    }
}

impl CommitRecord for CommitPayload {
    fn timestamp(&self) -> DateTime<Utc> {
        CommitPayload::timestamp(self)
    }

    fn message_len(&self) -> usize {
        self.commit.message.chars().count()
    }

    fn changed_lines(&self) -> u64 {
        self.stats.total
    }

    fn changed_chars(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| f.patch.as_deref())
            .map(count_changed_chars)
            .sum()
    }

    fn file_counts(&self) -> FileCounts {
        CommitPayload::file_counts(self)
    }
}

impl<T: CommitRecord + ?Sized> CommitRecord for &T {
    fn timestamp(&self) -> DateTime<Utc> {
        (**self).timestamp()
    }

    fn message_len(&self) -> usize {
        (**self).message_len()
    }

    fn changed_lines(&self) -> u64 {
        (**self).changed_lines()
    }

    fn changed_chars(&self) -> u64 {
        (**self).changed_chars()
    }

    fn file_counts(&self) -> FileCounts {
        (**self).file_counts()
    }
}

/// Sum of the lengths of every diff line starting with `+` or `-`.
///
/// Header lines (`+++ b/file`) count too. Empty lines contribute nothing.
pub fn count_changed_chars(patch: &str) -> u64 {
    patch
        .split('\n')
        .filter(|line| line.starts_with('+') || line.starts_with('-'))
        .map(|line| line.chars().count() as u64)
        .sum()
}

/// Per-metric aggregates over a window of commits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub commit_count: usize,
    /// Seconds between consecutive commits, in the order given
    pub intervals: Summary,
    pub changed_lines: Summary,
    pub changed_chars: Summary,
    pub message_len: Summary,
    pub added_files: Summary,
    pub modified_files: Summary,
    pub removed_files: Summary,
}

impl BatchSummary {
    /// Aggregate `records`, which must already be in a consistent order
    /// (intervals are `t[i] - t[i + 1]`).
    pub fn from_records<R: CommitRecord>(records: &[R]) -> Self {
        let mut changed_lines = Vec::with_capacity(records.len());
        let mut changed_chars = Vec::with_capacity(records.len());
        let mut message_len = Vec::with_capacity(records.len());
        let mut added = Vec::with_capacity(records.len());
        let mut modified = Vec::with_capacity(records.len());
        let mut removed = Vec::with_capacity(records.len());

        for record in records {
            let counts = record.file_counts();
            changed_lines.push(record.changed_lines() as f64);
            changed_chars.push(record.changed_chars() as f64);
            message_len.push(record.message_len() as f64);
            added.push(counts.added as f64);
            modified.push(counts.modified as f64);
            removed.push(counts.removed as f64);
        }

        let intervals: Vec<f64> = records
            .windows(2)
            .map(|pair| (pair[0].timestamp() - pair[1].timestamp()).num_milliseconds() as f64 / 1000.0)
            .collect();

        Self {
            commit_count: records.len(),
            intervals: Summary::from_values(&intervals),
            changed_lines: Summary::from_values(&changed_lines),
            changed_chars: Summary::from_values(&changed_chars),
            message_len: Summary::from_values(&message_len),
            added_files: Summary::from_values(&added),
            modified_files: Summary::from_values(&modified),
            removed_files: Summary::from_values(&removed),
        }
    }
}

/// Builds feature vectors from commit records
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Feature vector of a window of commits. An empty window is all zeros.
    pub fn extract<R: CommitRecord>(&self, records: &[R]) -> FeatureVector {
        FeatureVector::from_summary(&BatchSummary::from_records(records))
    }

    /// Feature vector of a single commit
    pub fn extract_one<R: CommitRecord>(&self, record: &R) -> FeatureVector {
        self.extract(std::slice::from_ref(record))
    }
}
