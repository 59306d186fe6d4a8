//! Feature extraction for anomaly classification
//!
//! Turns one commit or a window of commits into a fixed 16-field
//! [`FeatureVector`]. Works against API payloads and persisted commits alike
//! through the [`CommitRecord`] trait.

mod extractor;
mod vector;

pub use extractor::{count_changed_chars, BatchSummary, CommitRecord, FeatureExtractor};
pub use vector::FeatureVector;
