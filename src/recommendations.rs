//! Rule-based recovery recommendations
//!
//! Each rule looks at one aspect of the survey and may add messages. Rules are
//! independent and fire in a fixed order, so the output order is stable.

use crate::models::{MuscleGroup, RecoverySurvey};
use serde::{Deserialize, Serialize};

pub const SLEEP_HYGIENE: &str = "Focus on sleep hygiene - aim for 7-9 hours of quality sleep";
pub const REDUCE_INTENSITY: &str = "Consider reducing training intensity today";
pub const NUTRITION: &str = "Ensure adequate nutrition and hydration";
pub const LIGHTER_WORKOUT: &str = "Consider a lighter workout or active recovery";
pub const VARY_TRAINING: &str = "Try a different exercise style to maintain engagement";
pub const MOBILITY_WORK: &str = "Consider massage, stretching, or foam rolling for sore areas";
pub const FULL_REST: &str = "Take a full rest day - very high overall soreness";
pub const ACTIVE_RECOVERY: &str = "Consider active recovery only - walking, light stretching";
pub const GOOD_RECOVERY: &str = "Good recovery status - ready for normal training";

/// Thresholds at which each rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Sleep at or below this is poor
    pub poor_sleep: u8,
    /// Energy at or below this is low
    pub low_energy: u8,
    /// Motivation at or below this is low
    pub low_motivation: u8,
    /// A muscle at or above this should not be trained
    pub sore_muscle: u8,
    /// Overall soreness at or above this calls for a rest day
    pub rest_day_soreness: u8,
    /// Overall soreness at or above this (and below rest day) calls for active recovery
    pub active_recovery_soreness: u8,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        RecommendationThresholds {
            poor_sleep: 5,
            low_energy: 4,
            low_motivation: 4,
            sore_muscle: 7,
            rest_day_soreness: 8,
            active_recovery_soreness: 6,
        }
    }
}

/// Recommendation engine
pub struct RecommendationGenerator {
    thresholds: RecommendationThresholds,
}

impl RecommendationGenerator {
    pub fn new() -> Self {
        RecommendationGenerator {
            thresholds: RecommendationThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: RecommendationThresholds) -> Self {
        RecommendationGenerator { thresholds }
    }

    /// Ordered recommendations for one survey; never empty
    pub fn generate(&self, survey: &RecoverySurvey) -> Vec<String> {
        let t = &self.thresholds;
        let mut recommendations = Vec::new();

        if survey.sleep_quality <= t.poor_sleep {
            recommendations.push(SLEEP_HYGIENE.to_string());
        }

        if survey.energy_level <= t.low_energy {
            recommendations.push(REDUCE_INTENSITY.to_string());
            recommendations.push(NUTRITION.to_string());
        }

        if survey.motivation <= t.low_motivation {
            recommendations.push(LIGHTER_WORKOUT.to_string());
            recommendations.push(VARY_TRAINING.to_string());
        }

        let sore_muscles = survey.muscles.at_or_above(t.sore_muscle);
        if !sore_muscles.is_empty() {
            recommendations.push(Self::avoid_message(&sore_muscles));
            recommendations.push(MOBILITY_WORK.to_string());
        }

        // Rest day and active recovery are exclusive bands
        if survey.overall_soreness >= t.rest_day_soreness {
            recommendations.push(FULL_REST.to_string());
        } else if survey.overall_soreness >= t.active_recovery_soreness {
            recommendations.push(ACTIVE_RECOVERY.to_string());
        }

        if recommendations.is_empty() {
            recommendations.push(GOOD_RECOVERY.to_string());
        }

        recommendations
    }

    fn avoid_message(muscles: &[MuscleGroup]) -> String {
        let names: Vec<&str> = muscles.iter().map(MuscleGroup::as_str).collect();
        format!(
            "Avoid training {} today - high soreness detected",
            names.join(", ")
        )
    }
}

impl Default for RecommendationGenerator {
    fn default() -> Self {
        Self::new()
    }
}
