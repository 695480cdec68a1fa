//! Lifestyle recommendations keyed by risk category and individual vitals.
//!
//! Each item names a message template; the text itself lives with the
//! presentation layer. Order is fixed: category advice first, then one item per
//! triggered vital in the order BMI, heart rate, oxygen saturation.

use crate::engine::RiskCategory;
use crate::vitals::RawVitals;
use std::fmt;

pub const BMI_OVERWEIGHT_ABOVE: f64 = 25.0;
pub const HIGH_HEART_RATE_ABOVE: f64 = 100.0;
pub const LOW_OXYGEN_SATURATION_BELOW: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationKey {
    DoctorConsult,
    ReduceSodium,
    ModerateExercise,
    HealthyDiet,
    MaintainLifestyle,
    BmiOverweight,
    HighHeartRate,
    LowOxygenSaturation,
}

impl RecommendationKey {
    /// Message-template identifier understood by the presentation layer.
    pub fn template_id(self) -> &'static str {
        match self {
            RecommendationKey::DoctorConsult => "rec_high_risk_doctor",
            RecommendationKey::ReduceSodium => "rec_reduce_sodium",
            RecommendationKey::ModerateExercise => "rec_moderate_exercise",
            RecommendationKey::HealthyDiet => "rec_healthy_diet",
            RecommendationKey::MaintainLifestyle => "rec_low_risk_maintain",
            RecommendationKey::BmiOverweight => "rec_bmi_overweight",
            RecommendationKey::HighHeartRate => "rec_high_hr",
            RecommendationKey::LowOxygenSaturation => "rec_low_spo2",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            RecommendationKey::DoctorConsult => "🚨",
            RecommendationKey::ReduceSodium => "🧂",
            RecommendationKey::ModerateExercise => "🏃",
            RecommendationKey::HealthyDiet => "🥗",
            RecommendationKey::MaintainLifestyle => "🌟",
            RecommendationKey::BmiOverweight => "⚖️",
            RecommendationKey::HighHeartRate => "❤️",
            RecommendationKey::LowOxygenSaturation => "🫁",
        }
    }
}

impl fmt::Display for RecommendationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template_id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationItem {
    pub icon: &'static str,
    pub key: RecommendationKey,
}

impl From<RecommendationKey> for RecommendationItem {
    fn from(key: RecommendationKey) -> Self {
        Self {
            icon: key.icon(),
            key,
        }
    }
}

/// Builds the ordered recommendation list. An `Error` category contributes no
/// category advice.
pub fn recommendations(vitals: &RawVitals, category: RiskCategory) -> Vec<RecommendationItem> {
    use RecommendationKey::*;

    let mut keys: Vec<RecommendationKey> = match category {
        RiskCategory::High => vec![DoctorConsult, ReduceSodium],
        RiskCategory::Moderate => vec![ModerateExercise, HealthyDiet],
        RiskCategory::Low => vec![MaintainLifestyle],
        // Older releases fell back to the low-risk advice here.
        RiskCategory::Error => Vec::new(),
    };

    if vitals.bmi > BMI_OVERWEIGHT_ABOVE {
        keys.push(BmiOverweight);
    }
    if vitals.heart_rate > HIGH_HEART_RATE_ABOVE {
        keys.push(HighHeartRate);
    }
    if vitals.oxygen_saturation < LOW_OXYGEN_SATURATION_BELOW {
        keys.push(LowOxygenSaturation);
    }

    keys.into_iter().map(RecommendationItem::from).collect()
}
