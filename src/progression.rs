//! Next-session load progression
//!
//! The suggestion is the first matching entry of an ordered decision table.
//! Each entry pairs a predicate with a load action:
//!
//! | # | Rule | When | Load |
//! |---|---|---|---|
//! | 1 | starting weight | no recorded load | 20 compound / 10 isolation |
//! | 2 | standard progression | no survey | +2.5% |
//! | 3 | excellent recovery | readiness >= 0.8, recent RPE < 7 | +5% |
//! | 4 | good recovery | readiness >= 0.7 | +2.5% |
//! | 5 | poor recovery | readiness <= 0.4 or overall soreness >= 7 | -10% |
//! | 6 | maintain | otherwise | unchanged |
//!
//! Rules 3 and 4 also require overall soreness below the high-soreness
//! threshold, so a very sore athlete always lands on rule 5 no matter how
//! well they slept. Loads are rounded half away from zero to whole units.

use crate::error::ValidationError;
use crate::models::{ExerciseType, RecoveryMetrics, RecoverySurvey, SessionLog};
use crate::readiness::{round_score, ReadinessCalculator};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progression thresholds and multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Suggested first load for compound lifts
    pub compound_start_load: Decimal,

    /// Suggested first load for everything else
    pub isolation_start_load: Decimal,

    /// Multiplier when there is no survey to go on
    pub standard_multiplier: Decimal,

    /// Multiplier for excellent recovery
    pub excellent_multiplier: Decimal,

    /// Multiplier for good recovery
    pub good_multiplier: Decimal,

    /// Multiplier for poor recovery
    pub deload_multiplier: Decimal,

    /// Readiness at or above this is excellent
    pub excellent_readiness: Decimal,

    /// Readiness at or above this is good
    pub good_readiness: Decimal,

    /// Readiness at or below this is poor
    pub poor_readiness: Decimal,

    /// Recent average RPE must be below this for the excellent rule
    pub easy_rpe_ceiling: Decimal,

    /// Overall soreness at or above this forces a deload
    pub high_soreness: u8,

    /// Days of sessions averaged into the recent RPE
    pub rpe_window_days: u32,

    /// Oldest survey (in days) still used for readiness
    pub survey_lookback_days: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        ProgressionConfig {
            compound_start_load: dec!(20),
            isolation_start_load: dec!(10),
            standard_multiplier: dec!(1.025),
            excellent_multiplier: dec!(1.05),
            good_multiplier: dec!(1.025),
            deload_multiplier: dec!(0.9),
            excellent_readiness: dec!(0.8),
            good_readiness: dec!(0.7),
            poor_readiness: dec!(0.4),
            easy_rpe_ceiling: dec!(7),
            high_soreness: 7,
            rpe_window_days: 7,
            survey_lookback_days: 7,
        }
    }
}

/// Which decision rule produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionRule {
    StartingWeight,
    StandardProgression,
    ExcellentRecovery,
    GoodRecovery,
    PoorRecovery,
    Maintain,
}

impl ProgressionRule {
    pub fn reason(&self) -> &'static str {
        match self {
            ProgressionRule::StartingWeight => "Starting-weight suggestion",
            ProgressionRule::StandardProgression => "Standard progression (+2.5%)",
            ProgressionRule::ExcellentRecovery => "Excellent recovery, +5%",
            ProgressionRule::GoodRecovery => "Good recovery, small increase (+2.5%)",
            ProgressionRule::PoorRecovery => "Poor recovery, -10%",
            ProgressionRule::Maintain => "Normal recovery, maintain weight",
        }
    }
}

/// Everything a suggestion is computed from
#[derive(Debug, Clone, Copy)]
pub struct ProgressionInputs<'a> {
    pub current_load: Decimal,
    pub exercise_type: ExerciseType,
    pub survey: Option<&'a RecoverySurvey>,
    pub recent_rpe: Option<Decimal>,
}

/// Next-session load recommendation; computed per request, never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSuggestion {
    pub suggested_load: Decimal,
    pub readiness_index: Decimal,
    pub reason: String,
    pub rule: ProgressionRule,
    pub recent_rpe: Option<Decimal>,
    pub recovery_metrics: RecoveryMetrics,
}

/// Values the decision rules inspect
struct RuleContext<'a> {
    inputs: ProgressionInputs<'a>,
    readiness: Decimal,
}

impl RuleContext<'_> {
    fn highly_sore(&self, config: &ProgressionConfig) -> bool {
        self.inputs
            .survey
            .is_some_and(|s| s.overall_soreness >= config.high_soreness)
    }
}

type Predicate = fn(&RuleContext, &ProgressionConfig) -> bool;
/// `None` when the load does not fit in a `Decimal`
type LoadAction = fn(&RuleContext, &ProgressionConfig) -> Option<Decimal>;

struct DecisionRule {
    rule: ProgressionRule,
    applies: Predicate,
    load: LoadAction,
}

/// Evaluated top to bottom; the first rule that applies wins
const DECISION_TABLE: &[DecisionRule] = &[
    DecisionRule {
        rule: ProgressionRule::StartingWeight,
        applies: no_recorded_load,
        load: starting_load,
    },
    DecisionRule {
        rule: ProgressionRule::StandardProgression,
        applies: no_survey,
        load: standard_load,
    },
    DecisionRule {
        rule: ProgressionRule::ExcellentRecovery,
        applies: excellent_recovery,
        load: excellent_load,
    },
    DecisionRule {
        rule: ProgressionRule::GoodRecovery,
        applies: good_recovery,
        load: good_load,
    },
    DecisionRule {
        rule: ProgressionRule::PoorRecovery,
        applies: poor_recovery,
        load: deload,
    },
    DecisionRule {
        rule: ProgressionRule::Maintain,
        applies: always,
        load: unchanged_load,
    },
];

fn no_recorded_load(ctx: &RuleContext, _: &ProgressionConfig) -> bool {
    ctx.inputs.current_load.is_zero()
}

fn no_survey(ctx: &RuleContext, _: &ProgressionConfig) -> bool {
    ctx.inputs.survey.is_none()
}

fn excellent_recovery(ctx: &RuleContext, config: &ProgressionConfig) -> bool {
    ctx.readiness >= config.excellent_readiness
        && !ctx.highly_sore(config)
        && ctx
            .inputs
            .recent_rpe
            .is_some_and(|rpe| rpe < config.easy_rpe_ceiling)
}

fn good_recovery(ctx: &RuleContext, config: &ProgressionConfig) -> bool {
    ctx.readiness >= config.good_readiness && !ctx.highly_sore(config)
}

fn poor_recovery(ctx: &RuleContext, config: &ProgressionConfig) -> bool {
    ctx.readiness <= config.poor_readiness || ctx.highly_sore(config)
}

fn always(_: &RuleContext, _: &ProgressionConfig) -> bool {
    true
}

fn starting_load(ctx: &RuleContext, config: &ProgressionConfig) -> Option<Decimal> {
    match ctx.inputs.exercise_type {
        ExerciseType::Compound => Some(config.compound_start_load),
        ExerciseType::Isolation => Some(config.isolation_start_load),
    }
}

fn standard_load(ctx: &RuleContext, config: &ProgressionConfig) -> Option<Decimal> {
    ctx.inputs.current_load.checked_mul(config.standard_multiplier)
}

fn excellent_load(ctx: &RuleContext, config: &ProgressionConfig) -> Option<Decimal> {
    ctx.inputs.current_load.checked_mul(config.excellent_multiplier)
}

fn good_load(ctx: &RuleContext, config: &ProgressionConfig) -> Option<Decimal> {
    ctx.inputs.current_load.checked_mul(config.good_multiplier)
}

fn deload(ctx: &RuleContext, config: &ProgressionConfig) -> Option<Decimal> {
    ctx.inputs.current_load.checked_mul(config.deload_multiplier)
}

fn unchanged_load(ctx: &RuleContext, _: &ProgressionConfig) -> Option<Decimal> {
    Some(ctx.inputs.current_load)
}

/// Progression suggestion engine
pub struct ProgressionSuggester {
    config: ProgressionConfig,
}

impl ProgressionSuggester {
    pub fn new() -> Self {
        ProgressionSuggester {
            config: ProgressionConfig::default(),
        }
    }

    pub fn with_config(config: ProgressionConfig) -> Self {
        ProgressionSuggester { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Mean session RPE, or None without sessions
    pub fn average_rpe(sessions: &[SessionLog]) -> Option<Decimal> {
        if sessions.is_empty() {
            return None;
        }
        let total: u32 = sessions.iter().map(|s| u32::from(s.session_rpe)).sum();
        Some(Decimal::from(total) / Decimal::from(sessions.len() as u32))
    }

    /// Fails only when the scaled load overflows
    pub fn suggest(
        &self,
        inputs: ProgressionInputs<'_>,
    ) -> Result<ProgressionSuggestion, ValidationError> {
        let readiness = ReadinessCalculator::readiness_or_neutral(inputs.survey);
        let ctx = RuleContext { inputs, readiness };

        // The last row always applies
        let decision = DECISION_TABLE
            .iter()
            .find(|entry| (entry.applies)(&ctx, &self.config))
            .unwrap_or(&DECISION_TABLE[DECISION_TABLE.len() - 1]);

        let suggested_load = (decision.load)(&ctx, &self.config)
            .map(round_to_unit)
            .ok_or_else(|| ValidationError::TooLarge {
                field: "current_load".to_string(),
            })?;

        debug!(
            rule = ?decision.rule,
            current_load = %inputs.current_load,
            suggested_load = %suggested_load,
            readiness = %readiness,
            "Progression rule selected"
        );

        Ok(ProgressionSuggestion {
            suggested_load,
            readiness_index: round_score(readiness),
            reason: decision.rule.reason().to_string(),
            rule: decision.rule,
            recent_rpe: inputs.recent_rpe.map(round_score),
            recovery_metrics: inputs
                .survey
                .map(RecoveryMetrics::from_survey)
                .unwrap_or_else(RecoveryMetrics::neutral),
        })
    }
}

impl Default for ProgressionSuggester {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to a whole load unit, half away from zero
pub fn round_to_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
