#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod data;
pub mod engine;
pub mod normalize;
pub mod params;
pub mod recommend;
pub mod vitals;

pub use engine::{PredictionError, PredictionResult, RiskCategory, RiskInferenceEngine};
pub use params::{ConfigurationError, NetworkParameters};
pub use vitals::{Gender, RawVitals};
