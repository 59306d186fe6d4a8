//! Per-developer anomaly classification
//!
//! Each developer gets a min-max scaler and a one-class SVM fitted on their
//! own historical feature vectors. A new vector is scaled with the same
//! fitted scaler and classified as normal or anomalous.
//!
//! Models live in a [`ModelRegistry`]; callers hold [`ModelHandle`]s and must
//! retrain explicitly when a developer's history changes.

mod registry;
mod scaler;
mod svm;

pub use registry::{ModelHandle, ModelRegistry};
pub use scaler::MinMaxScaler;
pub use svm::{Classification, OneClassSvm};
