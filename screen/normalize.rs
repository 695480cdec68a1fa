//! Min-max normalization of raw vitals into the network's input domain.
//!
//! The bounds below were taken from the training distribution and must be
//! reproduced exactly; changing any of them changes every prediction.
//! Out-of-distribution values are not clamped and may fall outside `[0, 1]`.

use crate::params::INPUT_FEATURES;
use crate::vitals::{Gender, RawVitals};
use ndarray::Array1;

/// Inclusive training-distribution bounds for one numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub const fn new(name: &'static str, min: f64, max: f64) -> Self {
        Self { name, min, max }
    }

    /// `(value - min) / (max - min)`. `NaN` in, `NaN` out.
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

pub const AGE: FeatureRange = FeatureRange::new("age", 8.0, 97.0);
pub const TEMPERATURE: FeatureRange = FeatureRange::new("temperature", 35.69, 37.2);
pub const HEART_RATE: FeatureRange = FeatureRange::new("heart_rate", 45.0, 117.0);
pub const RESPIRATORY_RATE: FeatureRange = FeatureRange::new("respiratory_rate", 15.0, 22.0);
pub const OXYGEN_SATURATION: FeatureRange = FeatureRange::new("oxygen_saturation", 94.0, 100.0);
pub const WEIGHT: FeatureRange = FeatureRange::new("weight", 26.0, 98.0);
pub const HEIGHT: FeatureRange = FeatureRange::new("height", 137.0, 185.3);
pub const BMI: FeatureRange = FeatureRange::new("bmi", 13.45686, 34.94943);

/// Names of the normalized inputs, in the order the network expects them.
pub const FEATURE_ORDER: [&str; INPUT_FEATURES] = [
    "sex",
    AGE.name,
    TEMPERATURE.name,
    HEART_RATE.name,
    RESPIRATORY_RATE.name,
    OXYGEN_SATURATION.name,
    WEIGHT.name,
    HEIGHT.name,
    BMI.name,
];

/// Male encodes as 0, female as 1.
pub fn encode_sex(gender: Gender) -> f64 {
    match gender {
        Gender::Male => 0.0,
        Gender::Female => 1.0,
    }
}

/// Builds the 9-element input vector
/// `[sex, age, temperature, heartRate, respiratoryRate, oxygenSaturation, weight, height, bmi]`.
pub fn normalize(vitals: &RawVitals) -> Array1<f64> {
    Array1::from_vec(vec![
        encode_sex(vitals.gender),
        AGE.scale(vitals.age),
        TEMPERATURE.scale(vitals.temperature),
        HEART_RATE.scale(vitals.heart_rate),
        RESPIRATORY_RATE.scale(vitals.respiratory_rate),
        OXYGEN_SATURATION.scale(vitals.oxygen_saturation),
        WEIGHT.scale(vitals.weight),
        HEIGHT.scale(vitals.height),
        BMI.scale(vitals.bmi),
    ])
}
