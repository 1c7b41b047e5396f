//! Readiness scoring
//!
//! Reduces a recovery survey to a single readiness score on a 0-1 scale
//! using a fixed-weight composite:
//!
//! | Component | Signal | Weight |
//! |---|---|---|
//! | Muscle freshness | (10 - mean of six muscle scores) / 10 | 25% |
//! | Overall freshness | (10 - overall soreness) / 10 | 20% |
//! | Sleep | sleep quality / 10 | 25% |
//! | Energy | energy level / 10 | 15% |
//! | Motivation | motivation / 10 | 15% |
//!
//! The score is rounded to two decimals (half away from zero). It is the only
//! readiness formula in the crate; progression suggestions use the same one.

use crate::models::{MuscleGroup, RecoverySurvey};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Readiness used when there is no survey to score
pub const NEUTRAL_READINESS: Decimal = dec!(0.5);

const MUSCLE_WEIGHT: Decimal = dec!(0.25);
const OVERALL_WEIGHT: Decimal = dec!(0.20);
const SLEEP_WEIGHT: Decimal = dec!(0.25);
const ENERGY_WEIGHT: Decimal = dec!(0.15);
const MOTIVATION_WEIGHT: Decimal = dec!(0.15);

const SCALE_MAX: Decimal = dec!(10);

/// Muscle groups at or above this score are reported as dominant
pub const DOMINANT_SORENESS: u8 = 6;

/// Readiness bands, from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    Excellent,    // >= 0.8
    Good,         // 0.6 - 0.8
    BelowAverage, // 0.4 - 0.6
    Poor,         // < 0.4
}

impl ReadinessTier {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(0.8) {
            ReadinessTier::Excellent
        } else if score >= dec!(0.6) {
            ReadinessTier::Good
        } else if score >= dec!(0.4) {
            ReadinessTier::BelowAverage
        } else {
            ReadinessTier::Poor
        }
    }

    /// One-line training recommendation for the tier
    pub fn recommendation(&self) -> &'static str {
        match self {
            ReadinessTier::Excellent => "Excellent recovery! Ready for intense training.",
            ReadinessTier::Good => "Good recovery. Moderate training recommended.",
            ReadinessTier::BelowAverage => "Below average recovery. Consider light training.",
            ReadinessTier::Poor => "Poor recovery. Focus on rest and recovery.",
        }
    }

    /// Label used in survey analysis
    pub fn category(&self) -> &'static str {
        match self {
            ReadinessTier::Excellent => "excellent",
            ReadinessTier::Good => "good",
            ReadinessTier::BelowAverage => "moderate",
            ReadinessTier::Poor => "poor",
        }
    }

    pub fn intensity(&self) -> TrainingIntensity {
        match self {
            ReadinessTier::Excellent => TrainingIntensity::High,
            ReadinessTier::Good => TrainingIntensity::Moderate,
            ReadinessTier::BelowAverage => TrainingIntensity::Low,
            ReadinessTier::Poor => TrainingIntensity::Rest,
        }
    }
}

/// Recommended session intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingIntensity {
    High,
    Moderate,
    Low,
    Rest,
}

/// What the next session should concentrate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Recovery,
    Mobility,
    Strength,
    Progression,
    Maintenance,
    Technique,
}

/// Full readiness picture for one survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessAssessment {
    pub readiness_score: Decimal,
    pub tier: ReadinessTier,
    pub recommended_intensity: TrainingIntensity,
    pub focus_areas: Vec<FocusArea>,
    pub dominant_soreness_areas: Vec<MuscleGroup>,
}

/// Readiness calculation engine
pub struct ReadinessCalculator;

impl ReadinessCalculator {
    /// Weighted-composite readiness in [0, 1], two decimals
    pub fn readiness_score(survey: &RecoverySurvey) -> Decimal {
        let muscle_freshness = Self::freshness(survey.muscles.average());
        let overall_freshness = Self::freshness(Decimal::from(survey.overall_soreness));
        let sleep = Decimal::from(survey.sleep_quality) / SCALE_MAX;
        let energy = Decimal::from(survey.energy_level) / SCALE_MAX;
        let motivation = Decimal::from(survey.motivation) / SCALE_MAX;

        let score = MUSCLE_WEIGHT * muscle_freshness
            + OVERALL_WEIGHT * overall_freshness
            + SLEEP_WEIGHT * sleep
            + ENERGY_WEIGHT * energy
            + MOTIVATION_WEIGHT * motivation;

        round_score(score)
    }

    /// Score of the survey, or the neutral midpoint when there is none
    pub fn readiness_or_neutral(survey: Option<&RecoverySurvey>) -> Decimal {
        survey
            .map(Self::readiness_score)
            .unwrap_or(NEUTRAL_READINESS)
    }

    /// Score plus tier, intensity and focus guidance
    pub fn assess(survey: &RecoverySurvey) -> ReadinessAssessment {
        let readiness_score = Self::readiness_score(survey);
        let tier = ReadinessTier::from_score(readiness_score);

        let focus_areas = if survey.overall_soreness >= 6 {
            vec![FocusArea::Recovery, FocusArea::Mobility]
        } else if readiness_score >= dec!(0.7) {
            vec![FocusArea::Strength, FocusArea::Progression]
        } else {
            vec![FocusArea::Maintenance, FocusArea::Technique]
        };

        ReadinessAssessment {
            readiness_score,
            tier,
            recommended_intensity: tier.intensity(),
            focus_areas,
            dominant_soreness_areas: survey.muscles.at_or_above(DOMINANT_SORENESS),
        }
    }

    /// Invert a 0-10 soreness value into a 0-1 freshness signal
    fn freshness(soreness: Decimal) -> Decimal {
        ((SCALE_MAX - soreness) / SCALE_MAX).max(Decimal::ZERO)
    }
}

/// Round a readiness value to two decimals, half away from zero
pub fn round_score(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
