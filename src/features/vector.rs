//! Fixed-schema feature vector

use super::extractor::BatchSummary;
use serde::{Deserialize, Serialize};

/// Behavioral summary of a commit or a window of commits.
///
/// Field order is the model's input order; see [`FeatureVector::NAMES`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub interval_mean: f64,
    pub commit_count: f64,
    pub changed_chars_mean: f64,
    pub changed_chars_var: f64,
    pub changed_lines_mean: f64,
    pub changed_lines_var: f64,
    pub changed_lines_min: f64,
    pub changed_lines_max: f64,
    pub message_len_mean: f64,
    pub message_len_var: f64,
    pub added_files_mean: f64,
    pub added_files_var: f64,
    pub modified_files_mean: f64,
    pub modified_files_var: f64,
    pub removed_files_mean: f64,
    pub removed_files_var: f64,
}

impl FeatureVector {
    pub const LEN: usize = 16;

    pub const NAMES: [&'static str; Self::LEN] = [
        "interval_mean",
        "commit_count",
        "changed_chars_mean",
        "changed_chars_var",
        "changed_lines_mean",
        "changed_lines_var",
        "changed_lines_min",
        "changed_lines_max",
        "message_len_mean",
        "message_len_var",
        "added_files_mean",
        "added_files_var",
        "modified_files_mean",
        "modified_files_var",
        "removed_files_mean",
        "removed_files_var",
    ];

    pub fn from_summary(summary: &BatchSummary) -> Self {
        Self {
            interval_mean: summary.intervals.mean,
            commit_count: summary.commit_count as f64,
            changed_chars_mean: summary.changed_chars.mean,
            changed_chars_var: summary.changed_chars.variance,
            changed_lines_mean: summary.changed_lines.mean,
            changed_lines_var: summary.changed_lines.variance,
            changed_lines_min: summary.changed_lines.min,
            changed_lines_max: summary.changed_lines.max,
            message_len_mean: summary.message_len.mean,
            message_len_var: summary.message_len.variance,
            added_files_mean: summary.added_files.mean,
            added_files_var: summary.added_files.variance,
            modified_files_mean: summary.modified_files.mean,
            modified_files_var: summary.modified_files.variance,
            removed_files_mean: summary.removed_files.mean,
            removed_files_var: summary.removed_files.variance,
        }
    }

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.interval_mean,
            self.commit_count,
            self.changed_chars_mean,
            self.changed_chars_var,
            self.changed_lines_mean,
            self.changed_lines_var,
            self.changed_lines_min,
            self.changed_lines_max,
            self.message_len_mean,
            self.message_len_var,
            self.added_files_mean,
            self.added_files_var,
            self.modified_files_mean,
            self.modified_files_var,
            self.removed_files_mean,
            self.removed_files_var,
        ]
    }

    pub fn from_array(values: [f64; Self::LEN]) -> Self {
        let [interval_mean, commit_count, changed_chars_mean, changed_chars_var, changed_lines_mean, changed_lines_var, changed_lines_min, changed_lines_max, message_len_mean, message_len_var, added_files_mean, added_files_var, modified_files_mean, modified_files_var, removed_files_mean, removed_files_var] =
            values;
        Self {
            interval_mean,
            commit_count,
            changed_chars_mean,
            changed_chars_var,
            changed_lines_mean,
            changed_lines_var,
            changed_lines_min,
            changed_lines_max,
            message_len_mean,
            message_len_var,
            added_files_mean,
            added_files_var,
            modified_files_mean,
            modified_files_var,
            removed_files_mean,
            removed_files_var,
        }
    }

    /// Values rounded the way historical training rows are stored:
    /// whole numbers, except the interval mean which keeps 4 decimals.
    pub fn rounded(&self) -> Self {
        let mut values = self.to_array();
        for (i, v) in values.iter_mut().enumerate() {
            *v = if i == 0 {
                (*v * 10_000.0).round() / 10_000.0
            } else {
                v.round()
            };
        }
        Self::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_order_matches_names() {
        let mut values = [0.0; FeatureVector::LEN];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f64;
        }
        let fv = FeatureVector::from_array(values);
        assert_eq!(fv.commit_count, 1.0);
        assert_eq!(fv.changed_lines_max, 7.0);
        assert_eq!(fv.removed_files_var, 15.0);
        assert_eq!(FeatureVector::NAMES[7], "changed_lines_max");
    }

    #[test]
    fn test_rounded_keeps_interval_precision() {
        let fv = FeatureVector {
            interval_mean: 12.345678,
            changed_chars_mean: 10.5,
            message_len_var: 3.4,
            ..Default::default()
        };
        let r = fv.rounded();
        assert_eq!(r.interval_mean, 12.3457);
        assert_eq!(r.changed_chars_mean, 11.0);
        assert_eq!(r.message_len_var, 3.0);
    }
}
