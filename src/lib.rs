//! Commitguard - commit trust and anomaly scoring
//!
//! Scores incoming commits for trustworthiness and behavioral anomaly so that
//! commits coming from a compromised account or a malicious insider stand out.
//!
//! Three pieces cooperate:
//!
//! - [`rules`]: deterministic policy predicates producing a violation score,
//!   plus the author trust verdict
//! - [`stats`]: per-developer and per-repository baselines and the
//!   mean ± stddev outlier check the rules delegate to
//! - [`anomaly`]: a per-developer one-class model trained on historical
//!   feature vectors
//!
//! [`engine::ScoringEngine`] ties them together behind the three operations
//! the webhook/report side calls: `evaluate`, `train_anomaly_model` and
//! `classify`.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod git;
pub mod models;
pub mod report;
pub mod rules;
pub mod stats;
pub mod store;

pub use config::{load_engine_config, EngineConfig};
pub use engine::{ScoringEngine, Verdict};
pub use error::{EngineError, EngineResult};
