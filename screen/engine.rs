//! # Risk Inference Engine
//!
//! The forward pass of the single-hidden-layer screening network:
//!
//! 1. Normalize the raw vitals into the 9-element input vector `X`.
//! 2. Hidden layer: `H[j] = sigmoid(b[j] + sum_i X[i] * W[i][j])`.
//! 3. Output layer: `Y[k] = sum_j H[j] * Beta[j][k]` for the two classes
//!    `[no risk, risk]`.
//! 4. Softmax over the two logits, scaled to a percentage.
//! 5. A non-finite input or probability becomes an explicit error result. Only
//!    a finite probability is categorized: `>= 50` High, `>= 30` Moderate, else
//!    Low.
//!
//! The engine is a pure function of its inputs and the shared parameters.

use crate::normalize::{FEATURE_ORDER, normalize};
use crate::params::{ConfigurationError, NetworkParameters};
use crate::vitals::RawVitals;
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Probabilities at or above this are High.
pub const HIGH_RISK_THRESHOLD: f64 = 50.0;
/// Probabilities at or above this (and below High) are Moderate.
pub const MODERATE_RISK_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    /// The prediction could not be computed; never a risk level.
    Error,
}

impl RiskCategory {
    /// Closed lower bounds. The caller must have checked that `probability`
    /// is finite.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskCategory::High
        } else if probability >= MODERATE_RISK_THRESHOLD {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }

    pub fn is_error(self) -> bool {
        self == RiskCategory::Error
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::High => "High Risk",
            RiskCategory::Error => "Error",
        };
        write!(f, "{label}")
    }
}

/// Why a prediction came back as `RiskCategory::Error`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Input '{field}' is not a finite number.")]
    NonFiniteInput { field: &'static str },
    #[error("The network produced a non-finite probability.")]
    NonFiniteProbability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Percentage rounded to one decimal place.
    pub probability: f64,
    pub category: RiskCategory,
    /// The unrounded percentage.
    pub risk_score: f64,
    /// Set exactly when `category` is `Error`.
    pub error: Option<PredictionError>,
}

impl PredictionResult {
    fn from_probability(probability: f64) -> Self {
        Self {
            probability: (probability * 10.0).round() / 10.0,
            category: RiskCategory::from_probability(probability),
            risk_score: probability,
            error: None,
        }
    }

    fn failed(error: PredictionError) -> Self {
        Self {
            probability: 0.0,
            category: RiskCategory::Error,
            risk_score: 0.0,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category.is_error()
    }
}

/// Evaluates the screening network. Cloning is cheap: all clones share one
/// read-only copy of the parameters.
#[derive(Debug, Clone)]
pub struct RiskInferenceEngine {
    params: Arc<NetworkParameters>,
}

impl RiskInferenceEngine {
    pub fn new(params: NetworkParameters) -> Self {
        Self::from_shared(Arc::new(params))
    }

    pub fn from_shared(params: Arc<NetworkParameters>) -> Self {
        log::debug!(
            "Risk inference engine ready with {} hidden units",
            params.hidden_units()
        );
        Self { params }
    }

    /// Validates the arrays and builds an engine in one step.
    pub fn from_arrays(
        w: Array2<f64>,
        b: Array1<f64>,
        beta: Array2<f64>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(NetworkParameters::new(w, b, beta)?))
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    /// Runs the full forward pass for one person.
    pub fn infer(&self, vitals: &RawVitals) -> PredictionResult {
        let x = normalize(vitals);

        // Saturated sigmoids can turn an infinite input into a finite probability.
        if let Some(index) = x.iter().position(|v| !v.is_finite()) {
            let error = PredictionError::NonFiniteInput {
                field: FEATURE_ORDER[index],
            };
            log::warn!("Prediction failed: {error}");
            return PredictionResult::failed(error);
        }

        let probability = self.forward(x.view());
        if !probability.is_finite() {
            let error = PredictionError::NonFiniteProbability;
            log::warn!("Prediction failed: {error}");
            return PredictionResult::failed(error);
        }

        let result = PredictionResult::from_probability(probability);
        log::trace!(
            "Prediction: {:.4}% -> {}",
            result.risk_score,
            result.category
        );
        result
    }

    /// Screens many people in parallel. Results keep the input order.
    pub fn infer_batch(&self, batch: &[RawVitals]) -> Vec<PredictionResult> {
        batch.par_iter().map(|vitals| self.infer(vitals)).collect()
    }

    /// Probability of the risk class, as a percentage. May be non-finite even
    /// for finite inputs.
    fn forward(&self, x: ArrayView1<f64>) -> f64 {
        let hidden = self.hidden_layer(x);
        let logits = self.output_layer(hidden.view());
        softmax_percentage(logits[0], logits[1])
    }

    fn hidden_layer(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let w = self.params.w();
        let b = self.params.b();
        Array1::from_shape_fn(self.params.hidden_units(), |j| {
            let sum = x
                .iter()
                .zip(w.column(j).iter())
                .fold(b[j], |acc, (xi, wij)| acc + xi * wij);
            sigmoid(sum)
        })
    }

    fn output_layer(&self, hidden: ArrayView1<f64>) -> [f64; 2] {
        let beta = self.params.beta();
        let logit = |k: usize| {
            hidden
                .iter()
                .zip(beta.column(k).iter())
                .fold(0.0, |acc, (hj, bjk)| acc + hj * bjk)
        };
        [logit(0), logit(1)]
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// `100 * e^y1 / (e^y0 + e^y1)`, evaluated without rescaling so that results
/// match the reference model to the last bit. Very large logits overflow to a
/// non-finite value, which `infer` reports as an error.
pub fn softmax_percentage(y0: f64, y1: f64) -> f64 {
    let exp_y0 = y0.exp();
    let exp_y1 = y1.exp();
    (exp_y1 / (exp_y0 + exp_y1)) * 100.0
}
