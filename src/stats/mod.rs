//! Behavioral statistics
//!
//! - [`primitives`]: mean/variance and rounding helpers shared by every scorer
//! - [`baseline`]: per-developer and per-repository metric baselines
//! - [`daily`]: per (developer, day) commit aggregates used as anomaly training rows
//! - [`outlier`]: the mean ± stddev outlier check against a baseline

pub mod baseline;
pub mod daily;
pub mod outlier;
pub mod primitives;

pub use baseline::{Baseline, BaselineScope, MetricStats};
pub use daily::{compute_daily_stats, DailyCommitStats};
pub use outlier::{is_outlier, outlying_metrics, Observation, OutlierDetector, OutlierVerdict};
pub use primitives::{mean_and_variance, round_half_even, Summary};
