//! One-class support vector machine
//!
//! ν-formulation: minimise `½ αᵀQα` subject to `0 ≤ αᵢ ≤ 1` and
//! `Σαᵢ = ν·l`, where `Q` is the kernel matrix of the `l` training rows. The
//! solver is SMO with second-order working-set selection. It stops once the
//! maximal violating pair is within `tolerance`.
//!
//! The decision value of a row is `Σ αᵢ K(xᵢ, x) − ρ`; positive means the row
//! lies inside the learned support.

use crate::config::{AnomalyConfig, Gamma, Kernel};
use crate::error::{EngineError, EngineResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Floor for a non-positive curvature along the working pair
const TAU: f64 = 1e-12;

/// Outcome of classifying one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Normal,
    Anomalous,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Normal => write!(f, "normal"),
            Classification::Anomalous => write!(f, "anomalous"),
        }
    }
}

/// Kernel with gamma resolved against the training data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct KernelParams {
    kernel: Kernel,
    gamma: f64,
    degree: u32,
    coef0: f64,
}

impl KernelParams {
    fn resolve(config: &AnomalyConfig, data: &DMatrix<f64>) -> Self {
        let n_features = data.ncols().max(1) as f64;
        let gamma = match config.gamma {
            Gamma::Auto => 1.0 / n_features,
            Gamma::Scale => {
                let count = data.len().max(1) as f64;
                let mean = data.sum() / count;
                let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
                if variance > 0.0 {
                    1.0 / (n_features * variance)
                } else {
                    1.0
                }
            }
            Gamma::Value(value) => value,
        };
        Self {
            kernel: config.kernel,
            gamma,
            degree: config.degree,
            coef0: config.coef0,
        }
    }

    /// Kernel value from the dot product and the squared norms of both rows
    fn apply(&self, dot: f64, norm_x: f64, norm_y: f64) -> f64 {
        match self.kernel {
            Kernel::Linear => dot,
            Kernel::Poly => (self.gamma * dot + self.coef0).powi(self.degree as i32),
            Kernel::Rbf => (-self.gamma * (norm_x + norm_y - 2.0 * dot)).exp(),
            Kernel::Sigmoid => (self.gamma * dot + self.coef0).tanh(),
        }
    }

    fn matrix(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        let gram = data * data.transpose();
        let norms = gram.diagonal();
        DMatrix::from_fn(gram.nrows(), gram.ncols(), |i, j| {
            self.apply(gram[(i, j)], norms[i], norms[j])
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A fitted one-class model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvm {
    params: KernelParams,
    support_vectors: Vec<Vec<f64>>,
    coefficients: Vec<f64>,
    rho: f64,
    iterations: usize,
}

impl OneClassSvm {
    /// Fit on `data`, one training row per matrix row
    pub fn fit(data: &DMatrix<f64>, config: &AnomalyConfig) -> EngineResult<Self> {
        let l = data.nrows();
        if l == 0 {
            return Err(EngineError::InsufficientData {
                scope: "one-class training set".to_string(),
            });
        }

        let params = KernelParams::resolve(config, data);
        let q = params.matrix(data);
        let solution = Solver::new(&q, config.nu).solve(config.tolerance, config.max_iterations);

        let mut support_vectors: Vec<Vec<f64>> = Vec::new();
        let mut coefficients = Vec::new();
        for (i, alpha) in solution.alpha.iter().enumerate() {
            if *alpha > 0.0 {
                support_vectors.push(data.row(i).iter().copied().collect());
                coefficients.push(*alpha);
            }
        }

        debug!(
            "One-class fit: {} rows, {} support vectors, rho={:.6}, {} iterations",
            l,
            support_vectors.len(),
            solution.rho,
            solution.iterations
        );

        Ok(Self {
            params,
            support_vectors,
            coefficients,
            rho: solution.rho,
            iterations: solution.iterations,
        })
    }

    /// Signed distance from the learned boundary
    pub fn decision_function(&self, x: &[f64]) -> f64 {
        let norm_x = dot(x, x);
        let score: f64 = self
            .support_vectors
            .iter()
            .zip(&self.coefficients)
            .map(|(sv, coef)| coef * self.params.apply(dot(sv, x), dot(sv, sv), norm_x))
            .sum();
        score - self.rho
    }

    pub fn predict(&self, x: &[f64]) -> Classification {
        if self.decision_function(x) > 0.0 {
            Classification::Normal
        } else {
            Classification::Anomalous
        }
    }

    pub fn support_vector_count(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

struct Solution {
    alpha: Vec<f64>,
    rho: f64,
    iterations: usize,
}

struct Solver<'q> {
    q: &'q DMatrix<f64>,
    alpha: Vec<f64>,
    grad: DVector<f64>,
}

impl<'q> Solver<'q> {
    /// Feasible start: the first `floor(ν·l)` multipliers at the upper bound,
    /// the remainder on the next one
    fn new(q: &'q DMatrix<f64>, nu: f64) -> Self {
        let l = q.nrows();
        let total = nu * l as f64;
        let full = (total.floor() as usize).min(l);

        let mut alpha = vec![0.0; l];
        for a in alpha.iter_mut().take(full) {
            *a = 1.0;
        }
        if full < l {
            alpha[full] = total - full as f64;
        }

        let grad = q * DVector::from_column_slice(&alpha);
        Self { q, alpha, grad }
    }

    fn solve(mut self, tolerance: f64, max_iterations: usize) -> Solution {
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iterations {
            let Some((i, j)) = self.select_working_set(tolerance) else {
                converged = true;
                break;
            };
            iterations += 1;
            self.update_pair(i, j);
        }

        if !converged {
            warn!("One-class solver stopped at {} iterations without converging", max_iterations);
        }

        Solution {
            rho: self.rho(),
            alpha: self.alpha,
            iterations,
        }
    }

    /// Maximal violating pair with second-order selection of `j`.
    ///
    /// `None` once the optimality gap is below `tolerance`.
    fn select_working_set(&self, tolerance: f64) -> Option<(usize, usize)> {
        let l = self.alpha.len();

        let mut gmax = f64::NEG_INFINITY;
        let mut selected_i = None;
        for t in 0..l {
            if self.alpha[t] < 1.0 && -self.grad[t] >= gmax {
                gmax = -self.grad[t];
                selected_i = Some(t);
            }
        }
        let i = selected_i?;

        let mut gmax2 = f64::NEG_INFINITY;
        let mut selected_j = None;
        let mut best = f64::INFINITY;
        for t in 0..l {
            if self.alpha[t] <= 0.0 {
                continue;
            }
            gmax2 = gmax2.max(self.grad[t]);
            let grad_diff = gmax + self.grad[t];
            if grad_diff > 0.0 {
                let quad = self.curvature(i, t);
                let objective = -(grad_diff * grad_diff) / quad;
                if objective <= best {
                    best = objective;
                    selected_j = Some(t);
                }
            }
        }

        if gmax + gmax2 < tolerance {
            return None;
        }
        selected_j.map(|j| (i, j))
    }

    fn curvature(&self, i: usize, j: usize) -> f64 {
        let quad = self.q[(i, i)] + self.q[(j, j)] - 2.0 * self.q[(i, j)];
        if quad > 0.0 {
            quad
        } else {
            TAU
        }
    }

    /// Analytic two-variable step keeping `αᵢ + αⱼ` fixed and both in `[0, 1]`
    fn update_pair(&mut self, i: usize, j: usize) {
        let old_i = self.alpha[i];
        let old_j = self.alpha[j];

        let delta = (self.grad[i] - self.grad[j]) / self.curvature(i, j);
        let sum = old_i + old_j;
        let mut ai = old_i - delta;
        let mut aj = old_j + delta;

        if sum > 1.0 {
            if ai > 1.0 {
                ai = 1.0;
                aj = sum - 1.0;
            }
        } else if aj < 0.0 {
            aj = 0.0;
            ai = sum;
        }
        if sum > 1.0 {
            if aj > 1.0 {
                aj = 1.0;
                ai = sum - 1.0;
            }
        } else if ai < 0.0 {
            ai = 0.0;
            aj = sum;
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let delta_i = ai - old_i;
        let delta_j = aj - old_j;
        for k in 0..self.alpha.len() {
            self.grad[k] += self.q[(k, i)] * delta_i + self.q[(k, j)] * delta_j;
        }
    }

    /// Offset: mean gradient over free multipliers, else the midpoint of the
    /// bound-derived interval
    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut free = 0usize;

        for (alpha, grad) in self.alpha.iter().zip(self.grad.iter()) {
            if *alpha >= 1.0 {
                lower = lower.max(*grad);
            } else if *alpha <= 0.0 {
                upper = upper.min(*grad);
            } else {
                free += 1;
                free_sum += grad;
            }
        }

        if free > 0 {
            free_sum / free as f64
        } else if upper.is_infinite() {
            lower
        } else if lower.is_infinite() {
            upper
        } else {
            (upper + lower) / 2.0
        }
    }
}
