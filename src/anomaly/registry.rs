//! Per-developer model registry

use super::scaler::MinMaxScaler;
use super::svm::{Classification, OneClassSvm};
use crate::config::AnomalyConfig;
use crate::error::{EngineError, EngineResult};
use crate::features::FeatureVector;
use dashmap::DashMap;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque reference to one trained model.
///
/// Retraining a developer issues a new handle and invalidates the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelHandle {
    id: Uuid,
    developer: String,
}

impl ModelHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn developer(&self) -> &str {
        &self.developer
    }
}

/// Scaler and model fitted on one developer's history
struct TrainedModel {
    id: Uuid,
    scaler: MinMaxScaler,
    svm: OneClassSvm,
}

impl TrainedModel {
    fn fit(history: &[FeatureVector], config: &AnomalyConfig) -> EngineResult<Self> {
        let scaler = MinMaxScaler::fit(history)?;
        let rows: Vec<[f64; FeatureVector::LEN]> = history.iter().map(|v| scaler.transform(v)).collect();
        let data = DMatrix::from_fn(rows.len(), FeatureVector::LEN, |r, c| rows[r][c]);
        let svm = OneClassSvm::fit(&data, config)?;
        Ok(Self {
            id: Uuid::new_v4(),
            scaler,
            svm,
        })
    }

    fn decision(&self, vector: &FeatureVector) -> f64 {
        self.svm.decision_function(&self.scaler.transform(vector))
    }
}

/// Trained models keyed by developer.
///
/// Models are never shared between developers. Training replaces whatever
/// the developer had before; there is no incremental update.
#[derive(Default)]
pub struct ModelRegistry {
    models: DashMap<String, TrainedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit a scaler and a one-class model on `history` and register them.
    pub fn train(
        &self,
        developer: &str,
        history: &[FeatureVector],
        config: &AnomalyConfig,
    ) -> EngineResult<ModelHandle> {
        if history.is_empty() {
            return Err(EngineError::InsufficientHistory {
                developer: developer.to_string(),
            });
        }

        let model = TrainedModel::fit(history, config)?;
        let handle = ModelHandle {
            id: model.id,
            developer: developer.to_string(),
        };
        info!(
            "Trained anomaly model for {} on {} vectors ({} support vectors)",
            developer,
            history.len(),
            model.svm.support_vector_count()
        );
        self.models.insert(developer.to_string(), model);
        Ok(handle)
    }

    /// Train several developers in parallel. Results come back in input order.
    pub fn train_all(
        &self,
        histories: &[(String, Vec<FeatureVector>)],
        config: &AnomalyConfig,
    ) -> Vec<(String, EngineResult<ModelHandle>)> {
        histories
            .par_iter()
            .map(|(developer, history)| (developer.clone(), self.train(developer, history, config)))
            .collect()
    }

    /// Signed distance of `vector` from the developer's learned boundary
    pub fn decision(&self, handle: &ModelHandle, vector: &FeatureVector) -> EngineResult<f64> {
        let model = self
            .models
            .get(&handle.developer)
            .ok_or_else(|| EngineError::InsufficientHistory {
                developer: handle.developer.clone(),
            })?;
        if model.id != handle.id {
            return Err(EngineError::StaleModel {
                developer: handle.developer.clone(),
            });
        }
        Ok(model.decision(vector))
    }

    pub fn classify(&self, handle: &ModelHandle, vector: &FeatureVector) -> EngineResult<Classification> {
        let value = self.decision(handle, vector)?;
        debug!("Decision value for {}: {:.6}", handle.developer, value);
        Ok(if value > 0.0 {
            Classification::Normal
        } else {
            Classification::Anomalous
        })
    }

    /// Drop a developer's model. Returns whether one was registered.
    pub fn evict(&self, developer: &str) -> bool {
        self.models.remove(developer).is_some()
    }

    pub fn contains(&self, developer: &str) -> bool {
        self.models.contains_key(developer)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic daily vectors with a little spread on every field
    fn history(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| {
                let mut values = [0.0; FeatureVector::LEN];
                for (k, value) in values.iter_mut().enumerate() {
                    *value = 10.0 + ((i * 7 + k * 3) % 11) as f64 + (i as f64 * 0.37 + k as f64).sin();
                }
                FeatureVector::from_array(values)
            })
            .collect()
    }

    #[test]
    fn test_training_vectors_are_predominantly_normal() {
        let registry = ModelRegistry::new();
        let vectors = history(30);
        let handle = registry.train("ana", &vectors, &AnomalyConfig::default()).unwrap();

        let normal = vectors
            .iter()
            .filter(|v| registry.classify(&handle, v).unwrap() == Classification::Normal)
            .count();
        assert!(normal * 2 > vectors.len(), "only {} of {} normal", normal, vectors.len());
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let registry = ModelRegistry::new();
        let err = registry.train("ana", &[], &AnomalyConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { .. }));
        assert!(!registry.contains("ana"));
    }

    #[test]
    fn test_retraining_invalidates_old_handle() {
        let registry = ModelRegistry::new();
        let config = AnomalyConfig::default();
        let first = registry.train("ana", &history(10), &config).unwrap();
        let second = registry.train("ana", &history(12), &config).unwrap();
        assert_ne!(first.id(), second.id());

        let probe = history(1)[0];
        assert!(matches!(
            registry.classify(&first, &probe),
            Err(EngineError::StaleModel { .. })
        ));
        assert!(registry.classify(&second, &probe).is_ok());
    }

    #[test]
    fn test_evict() {
        let registry = ModelRegistry::new();
        let handle = registry.train("ana", &history(5), &AnomalyConfig::default()).unwrap();
        assert!(registry.evict("ana"));
        assert!(!registry.evict("ana"));
        assert!(matches!(
            registry.classify(&handle, &history(1)[0]),
            Err(EngineError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_models_are_per_developer() {
        let registry = ModelRegistry::new();
        let results = registry.train_all(
            &[
                ("ana".to_string(), history(8)),
                ("bob".to_string(), history(9)),
                ("eve".to_string(), Vec::new()),
            ],
            &AnomalyConfig::default(),
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "ana");
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.is_err());
        assert_eq!(registry.len(), 2);

        let ana = results[0].1.as_ref().unwrap();
        assert_eq!(ana.developer(), "ana");
        assert!(registry.evict("bob"));
        assert!(registry.classify(ana, &history(1)[0]).is_ok());
    }
}
