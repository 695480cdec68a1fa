//! # Vitals Intake
//!
//! Types for one person's measurements, from the text a user typed in to the
//! numeric record the engine consumes.
//!
//! - `VitalsForm` holds the raw text of each field, exactly as entered.
//! - `VitalsForm::validate` applies the plausibility checks an intake form
//!   performs before asking for a prediction. The engine itself never checks
//!   medical plausibility.
//! - `VitalsForm::to_raw_vitals` parses every field leniently. Text that is not
//!   a number becomes `NaN`, which the engine later reports as an error result
//!   rather than a risk category.
//! - `vitals_summary` compares each reading against its clinical reference range.

use std::fmt;
use thiserror::Error;

/// Binary sex encoding used by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Case-insensitive. Anything other than `male` is treated as female.
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("male") {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// One person's vital signs. Unparseable measurements are carried as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVitals {
    /// Years.
    pub age: f64,
    pub gender: Gender,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Beats per minute.
    pub heart_rate: f64,
    /// Breaths per minute.
    pub respiratory_rate: f64,
    /// Percent.
    pub oxygen_saturation: f64,
    /// kg/m², derived by the caller from weight and height.
    pub bmi: f64,
}

impl RawVitals {
    /// Returns a copy whose `bmi` is recomputed from `weight` and `height`.
    pub fn with_derived_bmi(self) -> Self {
        Self {
            bmi: body_mass_index(self.weight, self.height),
            ..self
        }
    }
}

/// `weight / (height_m)^2`, with height given in centimetres.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Parses one measurement. Empty, non-numeric or non-finite text (`inf`,
/// `1e400`) yields `NaN`.
pub fn parse_vital(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntakeError {
    #[error("The required field '{0}' is empty.")]
    MissingField(&'static str),
    #[error("The value '{value}' for '{field}' is outside the accepted range {min}-{max}.")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: f64,
        max: f64,
    },
}

/// A plausibility rule applied by `VitalsForm::validate`.
#[derive(Debug, Clone, Copy)]
struct IntakeRule {
    field: &'static str,
    min: f64,
    max: f64,
    required: bool,
}

const INTAKE_RULES: [IntakeRule; 7] = [
    IntakeRule {
        field: "age",
        min: 8.0,
        max: 120.0,
        required: true,
    },
    IntakeRule {
        field: "weight",
        min: 20.0,
        max: 300.0,
        required: true,
    },
    IntakeRule {
        field: "height",
        min: 50.0,
        max: 250.0,
        required: true,
    },
    IntakeRule {
        field: "heart_rate",
        min: 30.0,
        max: 250.0,
        required: true,
    },
    IntakeRule {
        field: "temperature",
        min: 30.0,
        max: 45.0,
        required: false,
    },
    IntakeRule {
        field: "respiratory_rate",
        min: 8.0,
        max: 60.0,
        required: false,
    },
    IntakeRule {
        field: "oxygen_saturation",
        min: 50.0,
        max: 100.0,
        required: false,
    },
];

/// The text of each field as entered, before any parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VitalsForm {
    pub age: String,
    pub gender: String,
    pub weight: String,
    pub height: String,
    pub temperature: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    pub oxygen_saturation: String,
}

impl VitalsForm {
    fn field_text(&self, field: &str) -> &str {
        match field {
            "age" => &self.age,
            "weight" => &self.weight,
            "height" => &self.height,
            "heart_rate" => &self.heart_rate,
            "temperature" => &self.temperature,
            "respiratory_rate" => &self.respiratory_rate,
            "oxygen_saturation" => &self.oxygen_saturation,
            _ => "",
        }
    }

    /// Checks required fields first, then every present field against its range.
    /// Optional fields that are left empty are accepted here; they reach the
    /// engine as `NaN` and come back as an error result.
    pub fn validate(&self) -> Result<(), IntakeError> {
        for rule in INTAKE_RULES.iter().filter(|rule| rule.required) {
            if self.field_text(rule.field).trim().is_empty() {
                return Err(IntakeError::MissingField(rule.field));
            }
        }

        for rule in &INTAKE_RULES {
            let text = self.field_text(rule.field).trim();
            if !rule.required && text.is_empty() {
                continue;
            }
            let value = parse_vital(text);
            if value.is_nan() || value < rule.min || value > rule.max {
                return Err(IntakeError::OutOfRange {
                    field: rule.field,
                    value: text.to_string(),
                    min: rule.min,
                    max: rule.max,
                });
            }
        }

        Ok(())
    }

    /// Parses every field leniently and derives BMI.
    pub fn to_raw_vitals(&self) -> RawVitals {
        RawVitals {
            age: parse_vital(&self.age),
            gender: Gender::parse(&self.gender),
            weight: parse_vital(&self.weight),
            height: parse_vital(&self.height),
            temperature: parse_vital(&self.temperature),
            heart_rate: parse_vital(&self.heart_rate),
            respiratory_rate: parse_vital(&self.respiratory_rate),
            oxygen_saturation: parse_vital(&self.oxygen_saturation),
            bmi: f64::NAN,
        }
        .with_derived_bmi()
    }
}

/// Ready-made example patients, one per risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamplePreset {
    Low,
    Moderate,
    High,
}

impl ExamplePreset {
    pub fn form(self) -> VitalsForm {
        let values: [&str; 8] = match self {
            ExamplePreset::Low => ["28", "female", "52", "162", "36.5", "72", "16", "99"],
            ExamplePreset::Moderate => ["45", "male", "75", "170", "37.2", "95", "18", "96"],
            ExamplePreset::High => ["65", "male", "90", "168", "37.8", "115", "24", "93"],
        };
        let field = |index: usize| values[index].to_string();
        VitalsForm {
            age: field(0),
            gender: field(1),
            weight: field(2),
            height: field(3),
            temperature: field(4),
            heart_rate: field(5),
            respiratory_rate: field(6),
            oxygen_saturation: field(7),
        }
    }
}

/// Where a reading falls relative to its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalStatus {
    Low,
    Normal,
    High,
    /// The reading is missing or not a number.
    Unknown,
}

impl fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VitalStatus::Low => "low",
            VitalStatus::Normal => "normal",
            VitalStatus::High => "high",
            VitalStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    pub fn status(&self, value: f64) -> VitalStatus {
        if !value.is_finite() {
            VitalStatus::Unknown
        } else if value < self.min {
            VitalStatus::Low
        } else if value > self.max {
            VitalStatus::High
        } else {
            VitalStatus::Normal
        }
    }
}

impl fmt::Display for ReferenceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

pub const HEART_RATE_REFERENCE: ReferenceRange = ReferenceRange {
    min: 60.0,
    max: 100.0,
};
pub const TEMPERATURE_REFERENCE: ReferenceRange = ReferenceRange {
    min: 36.5,
    max: 37.5,
};
pub const RESPIRATORY_RATE_REFERENCE: ReferenceRange = ReferenceRange {
    min: 12.0,
    max: 20.0,
};
pub const OXYGEN_SATURATION_REFERENCE: ReferenceRange = ReferenceRange {
    min: 95.0,
    max: 100.0,
};
pub const BMI_REFERENCE: ReferenceRange = ReferenceRange {
    min: 18.5,
    max: 24.9,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalReading {
    pub name: &'static str,
    /// Display value. BMI is rounded to one decimal place.
    pub value: f64,
    pub reference: ReferenceRange,
    pub status: VitalStatus,
}

impl VitalReading {
    fn new(name: &'static str, value: f64, reference: ReferenceRange) -> Self {
        Self {
            name,
            value,
            reference,
            status: reference.status(value),
        }
    }
}

/// Heart rate, temperature, respiratory rate, SpO2 and BMI, in that order.
/// Status is judged on the unrounded value.
pub fn vitals_summary(vitals: &RawVitals) -> Vec<VitalReading> {
    let mut bmi = VitalReading::new("bmi", vitals.bmi, BMI_REFERENCE);
    bmi.value = (vitals.bmi * 10.0).round() / 10.0;

    vec![
        VitalReading::new("heart_rate", vitals.heart_rate, HEART_RATE_REFERENCE),
        VitalReading::new("temperature", vitals.temperature, TEMPERATURE_REFERENCE),
        VitalReading::new(
            "respiratory_rate",
            vitals.respiratory_rate,
            RESPIRATORY_RATE_REFERENCE,
        ),
        VitalReading::new(
            "oxygen_saturation",
            vitals.oxygen_saturation,
            OXYGEN_SATURATION_REFERENCE,
        ),
        bmi,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gender_parsing_is_case_insensitive_and_binary() {
        assert_eq!(Gender::parse("Male"), Gender::Male);
        assert_eq!(Gender::parse("MALE"), Gender::Male);
        assert_eq!(Gender::parse("male"), Gender::Male);
        assert_eq!(Gender::parse("female"), Gender::Female);
        assert_eq!(Gender::parse("other"), Gender::Female);
        assert_eq!(Gender::parse(""), Gender::Female);
    }

    #[test]
    fn bmi_uses_height_in_metres() {
        assert_abs_diff_eq!(body_mass_index(52.0, 162.0), 19.814, epsilon = 1e-3);
        assert_abs_diff_eq!(body_mass_index(90.0, 168.0), 31.888, epsilon = 1e-3);
    }

    #[test]
    fn unparseable_text_becomes_nan() {
        assert!(parse_vital("").is_nan());
        assert!(parse_vital("seventy").is_nan());
        assert_eq!(parse_vital(" 72 "), 72.0);
    }

    #[test]
    fn non_finite_text_becomes_nan() {
        for text in ["inf", "-infinity", "1e400", "NaN"] {
            assert!(parse_vital(text).is_nan(), "{text:?} should parse to NaN");
        }
    }

    #[test]
    fn form_with_blank_field_yields_nan_vital() {
        let mut form = ExamplePreset::Low.form();
        form.temperature.clear();
        let vitals = form.to_raw_vitals();
        assert!(vitals.temperature.is_nan());
        assert_eq!(vitals.gender, Gender::Female);
        assert_abs_diff_eq!(vitals.bmi, 52.0 / (1.62 * 1.62), epsilon = 1e-9);
    }

    #[test]
    fn presets_pass_validation() {
        for preset in [
            ExamplePreset::Low,
            ExamplePreset::Moderate,
            ExamplePreset::High,
        ] {
            assert_eq!(preset.form().validate(), Ok(()));
        }
    }

    #[test]
    fn missing_required_field_is_reported_before_ranges() {
        let mut form = ExamplePreset::High.form();
        form.heart_rate = "  ".to_string();
        form.age = "400".to_string();
        assert_eq!(
            form.validate(),
            Err(IntakeError::MissingField("heart_rate"))
        );
    }

    #[test]
    fn out_of_range_and_garbage_values_are_rejected() {
        let mut form = ExamplePreset::Moderate.form();
        form.age = "7".to_string();
        match form.validate() {
            Err(IntakeError::OutOfRange { field, value, .. }) => {
                assert_eq!(field, "age");
                assert_eq!(value, "7");
            }
            other => panic!("Expected OutOfRange for age, got {:?}", other),
        }

        let mut form = ExamplePreset::Moderate.form();
        form.oxygen_saturation = "abc".to_string();
        assert!(matches!(
            form.validate(),
            Err(IntakeError::OutOfRange {
                field: "oxygen_saturation",
                ..
            })
        ));
    }

    #[test]
    fn optional_fields_may_be_empty() {
        let mut form = ExamplePreset::Low.form();
        form.temperature.clear();
        form.respiratory_rate.clear();
        form.oxygen_saturation.clear();
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn summary_flags_readings_against_reference_ranges() {
        let vitals = ExamplePreset::High.form().to_raw_vitals();
        let summary = vitals_summary(&vitals);
        let statuses: Vec<_> = summary.iter().map(|r| (r.name, r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("heart_rate", VitalStatus::High),
                ("temperature", VitalStatus::High),
                ("respiratory_rate", VitalStatus::High),
                ("oxygen_saturation", VitalStatus::Low),
                ("bmi", VitalStatus::High),
            ]
        );
        assert_abs_diff_eq!(summary[4].value, 31.9, epsilon = 1e-9);
    }

    #[test]
    fn summary_marks_nan_as_unknown() {
        let mut vitals = ExamplePreset::Low.form().to_raw_vitals();
        vitals.heart_rate = f64::NAN;
        assert_eq!(vitals_summary(&vitals)[0].status, VitalStatus::Unknown);
        assert_eq!(HEART_RATE_REFERENCE.to_string(), "60-100");
    }
}
