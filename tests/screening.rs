use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vitalrisk::engine::{HIGH_RISK_THRESHOLD, MODERATE_RISK_THRESHOLD};
use vitalrisk::recommend::recommendations;
use vitalrisk::vitals::ExamplePreset;
use vitalrisk::{
    ConfigurationError, Gender, NetworkParameters, PredictionError, RawVitals, RiskCategory,
    RiskInferenceEngine,
};

fn demo_model_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models/demo_parameters.toml")
}

fn demo_engine() -> RiskInferenceEngine {
    let params = NetworkParameters::load(&demo_model_path()).expect("load demo parameters");
    RiskInferenceEngine::new(params)
}

fn preset_vitals(preset: ExamplePreset) -> RawVitals {
    preset.form().to_raw_vitals()
}

#[test]
fn example_patients_land_in_their_bands() {
    let engine = demo_engine();

    let low = engine.infer(&preset_vitals(ExamplePreset::Low));
    assert_eq!(low.category, RiskCategory::Low);
    assert!(low.probability < MODERATE_RISK_THRESHOLD);
    assert_abs_diff_eq!(low.probability, 5.1, epsilon = 1e-9);

    let moderate = engine.infer(&preset_vitals(ExamplePreset::Moderate));
    assert_eq!(moderate.category, RiskCategory::Moderate);
    assert!(moderate.probability >= MODERATE_RISK_THRESHOLD);
    assert!(moderate.probability < HIGH_RISK_THRESHOLD);
    assert_abs_diff_eq!(moderate.probability, 39.5, epsilon = 1e-9);

    let high = engine.infer(&preset_vitals(ExamplePreset::High));
    assert_eq!(high.category, RiskCategory::High);
    assert!(high.probability >= HIGH_RISK_THRESHOLD);
    assert_abs_diff_eq!(high.probability, 94.5, epsilon = 1e-9);
}

#[test]
fn high_example_gets_full_advice_list() {
    let engine = demo_engine();
    let vitals = preset_vitals(ExamplePreset::High);
    let result = engine.infer(&vitals);
    let keys: Vec<_> = recommendations(&vitals, result.category)
        .iter()
        .map(|item| item.key.template_id())
        .collect();
    assert_eq!(
        keys,
        vec![
            "rec_high_risk_doctor",
            "rec_reduce_sodium",
            "rec_bmi_overweight",
            "rec_high_hr",
            "rec_low_spo2",
        ]
    );
}

#[test]
fn repeated_inference_is_bit_identical() {
    let engine = demo_engine();
    let vitals = preset_vitals(ExamplePreset::Moderate);
    let first = engine.infer(&vitals);
    for _ in 0..100 {
        let again = engine.infer(&vitals);
        assert_eq!(again.risk_score.to_bits(), first.risk_score.to_bits());
        assert_eq!(again, first);
    }
}

#[test]
fn probability_stays_within_percentage_bounds() {
    let engine = demo_engine();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..2_000 {
        let weight = rng.gen_range(20.0..300.0);
        let height = rng.gen_range(50.0..250.0);
        let vitals = RawVitals {
            age: rng.gen_range(8.0..120.0),
            gender: if rng.gen_bool(0.5) {
                Gender::Male
            } else {
                Gender::Female
            },
            weight,
            height,
            temperature: rng.gen_range(30.0..45.0),
            heart_rate: rng.gen_range(30.0..250.0),
            respiratory_rate: rng.gen_range(8.0..60.0),
            oxygen_saturation: rng.gen_range(50.0..100.0),
            bmi: 0.0,
        }
        .with_derived_bmi();

        let result = engine.infer(&vitals);
        assert!(!result.is_error(), "unexpected error for {vitals:?}");
        assert!((0.0..=100.0).contains(&result.probability));
        assert_eq!(
            result.category,
            RiskCategory::from_probability(result.risk_score)
        );
    }
}

#[test]
fn shared_engine_gives_same_answers_on_every_thread() {
    let engine = Arc::new(demo_engine());
    let presets = [
        ExamplePreset::Low,
        ExamplePreset::Moderate,
        ExamplePreset::High,
    ];
    let expected: Vec<_> = presets
        .iter()
        .map(|preset| engine.infer(&preset_vitals(*preset)))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                presets
                    .iter()
                    .map(|preset| engine.infer(&preset_vitals(*preset)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("worker thread panicked"), expected);
    }
}

#[test]
fn batch_matches_single_inference() {
    let engine = demo_engine();
    let mut broken = preset_vitals(ExamplePreset::Low);
    broken.oxygen_saturation = f64::NAN;
    let batch = vec![
        preset_vitals(ExamplePreset::High),
        broken,
        preset_vitals(ExamplePreset::Low),
    ];

    let results = engine.infer_batch(&batch);
    assert_eq!(results.len(), 3);
    for (vitals, result) in batch.iter().zip(&results) {
        assert_eq!(*result, engine.infer(vitals));
    }
    assert_eq!(
        results[1].error,
        Some(PredictionError::NonFiniteInput {
            field: "oxygen_saturation"
        })
    );
}

#[test]
fn eight_input_rows_cannot_build_an_engine() {
    let result = RiskInferenceEngine::from_arrays(
        Array2::zeros((8, 3)),
        Array1::zeros(3),
        Array2::zeros((3, 2)),
    );
    match result {
        Err(ConfigurationError::MismatchedInputRows { found, expected }) => {
            assert_eq!((found, expected), (8, 9));
        }
        other => panic!("Expected MismatchedInputRows, got {:?}", other),
    }
}
