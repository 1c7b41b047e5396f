//! Session load calculation
//!
//! `total_load` is the session's volume load (sets x reps x weight summed over
//! exercises) scaled by session length, with sessions up to an hour counted
//! as one hour:
//!
//! ```text
//! total_load = sum(sets * avg_reps * avg_weight) * max(1, duration_minutes / 60)
//! rpe_load   = total_load * session_rpe        (Foster session-RPE)
//! ```
//!
//! Both are rounded to two decimals.

use crate::error::ValidationError;
use crate::models::{ExerciseEntry, SessionLog};
use crate::validation::SessionInput;
use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MINUTES_PER_HOUR: Decimal = dec!(60);

/// Session load engine
pub struct SessionLoadCalculator;

impl SessionLoadCalculator {
    /// Sum of sets x reps x weight
    pub fn volume_load(exercises: &[ExerciseEntry]) -> Result<Decimal, ValidationError> {
        exercises
            .iter()
            .enumerate()
            .try_fold(Decimal::ZERO, |total, (index, e)| {
                e.sets
                    .checked_mul(e.avg_reps)
                    .and_then(|volume| volume.checked_mul(e.avg_weight))
                    .and_then(|volume| total.checked_add(volume))
                    .ok_or_else(|| too_large(format!("exercises[{}]", index)))
            })
    }

    /// Hours of training, never below one
    pub fn duration_factor(duration_minutes: Decimal) -> Decimal {
        (duration_minutes / MINUTES_PER_HOUR).max(Decimal::ONE)
    }

    pub fn total_load(
        exercises: &[ExerciseEntry],
        duration_minutes: Decimal,
    ) -> Result<Decimal, ValidationError> {
        Self::volume_load(exercises)?
            .checked_mul(Self::duration_factor(duration_minutes))
            .map(round_load)
            .ok_or_else(|| too_large("duration_minutes"))
    }

    pub fn rpe_load(total_load: Decimal, session_rpe: u8) -> Result<Decimal, ValidationError> {
        total_load
            .checked_mul(Decimal::from(session_rpe))
            .map(round_load)
            .ok_or_else(|| too_large("exercises"))
    }

    /// Distinct exercises by trimmed, case-insensitive name; unnamed entries count once each
    pub fn distinct_exercise_count(exercises: &[ExerciseEntry]) -> u32 {
        let mut names = HashSet::new();
        let mut unnamed = 0u32;

        for exercise in exercises {
            match exercise.exercise_name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => {
                    names.insert(name.to_lowercase());
                }
                _ => unnamed += 1,
            }
        }

        names.len() as u32 + unnamed
    }

    /// Derive the persisted session record from a validated payload
    pub fn build_log(input: &SessionInput) -> Result<SessionLog, ValidationError> {
        let total_load = Self::total_load(&input.exercises, input.duration_minutes)?;

        Ok(SessionLog {
            user_id: input.user_id.clone(),
            date: input.date,
            session_rpe: input.session_rpe,
            duration_minutes: input.duration_minutes,
            total_load,
            rpe_load: Self::rpe_load(total_load, input.session_rpe)?,
            exercise_count: Self::distinct_exercise_count(&input.exercises),
            notes: input.notes.clone(),
        })
    }
}

fn too_large(field: impl Into<String>) -> ValidationError {
    ValidationError::TooLarge {
        field: field.into(),
    }
}

/// Round a load value to two decimals, half away from zero
pub fn round_load(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Windows and ratios used to put a new session in context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Acute window in days (also the "recent" window)
    pub acute_days: u32,

    /// Chronic window in days
    pub chronic_days: u32,

    /// RPE at or above this prompts a DOMS survey tomorrow
    pub survey_prompt_rpe: u8,

    /// RPE at or below this can count as progression-ready
    pub easy_session_rpe: u8,

    /// rpe_load above average x this flags a recovery focus
    pub recovery_focus_ratio: Decimal,

    /// rpe_load at or below average x this allows progression
    pub progression_ratio: Decimal,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            acute_days: 7,
            chronic_days: 28,
            survey_prompt_rpe: 7,
            easy_session_rpe: 6,
            recovery_focus_ratio: dec!(1.2),
            progression_ratio: dec!(1.1),
        }
    }
}

/// Direction of this session's load relative to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTrend {
    Increasing,
    Stable,
    Decreasing,
    InsufficientData,
}

/// Recent-history context for a newly logged session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub avg_rpe_load_last_7_days: Decimal,
    pub sessions_last_7_days: usize,
    pub load_trend: LoadTrend,
    /// Acute:chronic workload ratio
    pub acwr: Decimal,
}

/// Follow-up prompts derived from the session and its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSuggestions {
    pub tomorrow_doms_survey: bool,
    pub recovery_focus: bool,
    pub progression_ready: bool,
}

impl SessionContext {
    /// Evaluate `current` against `history` (any order; may or may not contain `current`)
    pub fn evaluate(current: &SessionLog, history: &[SessionLog], config: &WorkloadConfig) -> Self {
        let acute_start = window_start(current.date, config.acute_days);
        let chronic_start = window_start(current.date, config.chronic_days);

        let mut earlier: Vec<&SessionLog> = history
            .iter()
            .filter(|s| s.date != current.date && s.date <= current.date)
            .filter(|s| s.date >= chronic_start)
            .collect();
        earlier.sort_by(|a, b| b.date.cmp(&a.date));

        let acute: Vec<Decimal> = std::iter::once(current.rpe_load)
            .chain(
                earlier
                    .iter()
                    .filter(|s| s.date >= acute_start)
                    .map(|s| s.rpe_load),
            )
            .collect();
        let chronic: Vec<Decimal> = std::iter::once(current.rpe_load)
            .chain(earlier.iter().map(|s| s.rpe_load))
            .collect();

        let acute_mean = mean(&acute);
        let chronic_mean = mean(&chronic);

        let load_trend = match earlier.iter().find(|s| s.date >= acute_start) {
            None => LoadTrend::InsufficientData,
            Some(previous) if current.rpe_load > previous.rpe_load => LoadTrend::Increasing,
            Some(previous) if current.rpe_load < previous.rpe_load => LoadTrend::Decreasing,
            Some(_) => LoadTrend::Stable,
        };

        let acwr = if chronic_mean.is_zero() {
            Decimal::ONE
        } else {
            round_load(acute_mean / chronic_mean)
        };

        SessionContext {
            avg_rpe_load_last_7_days: round_load(acute_mean),
            sessions_last_7_days: acute.len(),
            load_trend,
            acwr,
        }
    }

    pub fn suggestions(&self, current: &SessionLog, config: &WorkloadConfig) -> SessionSuggestions {
        let average = self.avg_rpe_load_last_7_days;
        SessionSuggestions {
            tomorrow_doms_survey: current.session_rpe >= config.survey_prompt_rpe,
            recovery_focus: current.rpe_load > average.saturating_mul(config.recovery_focus_ratio),
            progression_ready: current.session_rpe <= config.easy_session_rpe
                && current.rpe_load <= average.saturating_mul(config.progression_ratio),
        }
    }
}

/// First date of a window of `days` days ending at `end`
pub fn window_start(end: NaiveDate, days: u32) -> NaiveDate {
    end.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    // Dividing first keeps the running sum within range for stored loads near the limit
    let count = Decimal::from(values.len() as u64);
    values
        .iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(*value / count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(name: &str, sets: Decimal, reps: Decimal, weight: Decimal) -> ExerciseEntry {
        ExerciseEntry {
            exercise_name: Some(name.to_string()),
            sets,
            avg_reps: reps,
            avg_weight: weight,
        }
    }

    fn create_log(day: u32, rpe: u8, rpe_load: Decimal) -> SessionLog {
        SessionLog {
            user_id: "test_athlete".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
            session_rpe: rpe,
            duration_minutes: dec!(60),
            total_load: rpe_load / Decimal::from(rpe),
            rpe_load,
            exercise_count: 1,
            notes: None,
        }
    }

    #[test]
    fn test_short_session_uses_one_hour() {
        let exercises = vec![
            exercise("Squat", dec!(5), dec!(5), dec!(100)),
            exercise("Bench", dec!(3), dec!(8), dec!(60)),
        ];
        // 2500 + 1440
        assert_eq!(SessionLoadCalculator::total_load(&exercises, dec!(45)).unwrap(), dec!(3940));
    }

    #[test]
    fn test_long_session_scales_load() {
        let exercises = vec![exercise("Deadlift", dec!(3), dec!(5), dec!(140))];
        // 2100 * 1.5
        assert_eq!(SessionLoadCalculator::total_load(&exercises, dec!(90)).unwrap(), dec!(3150));
    }

    #[test]
    fn test_fractional_values_round_to_cents() {
        let exercises = vec![exercise("Curl", dec!(3), dec!(10.333), dec!(12.5))];
        // 387.4875 * (70 / 60) = 452.06875
        let total = SessionLoadCalculator::total_load(&exercises, dec!(70)).unwrap();
        assert_eq!(total, dec!(452.07));
        assert_eq!(SessionLoadCalculator::rpe_load(total, 7).unwrap(), dec!(3164.49));
    }

    #[test]
    fn test_distinct_exercise_count() {
        let exercises = vec![
            exercise("Squat", dec!(1), dec!(1), dec!(1)),
            exercise(" squat ", dec!(1), dec!(1), dec!(1)),
            exercise("Row", dec!(1), dec!(1), dec!(1)),
            ExerciseEntry::default(),
        ];
        assert_eq!(SessionLoadCalculator::distinct_exercise_count(&exercises), 3);
    }

    #[test]
    fn test_build_log_links_rpe_load() {
        let input = SessionInput {
            user_id: "test_athlete".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 23).unwrap(),
            session_rpe: 8,
            duration_minutes: dec!(60),
            exercises: vec![exercise("Press", dec!(4), dec!(6), dec!(42.5))],
            notes: None,
        };
        let log = SessionLoadCalculator::build_log(&input).unwrap();
        assert_eq!(log.total_load, dec!(1020));
        assert_eq!(log.rpe_load, dec!(8160));
        assert_eq!(log.exercise_count, 1);
    }

    #[test]
    fn test_oversized_volume_names_exercise() {
        let huge = dec!(10000000000);
        let exercises = vec![
            exercise("Squat", dec!(5), dec!(5), dec!(100)),
            exercise("Sled", huge, huge, huge),
        ];
        let err = SessionLoadCalculator::total_load(&exercises, dec!(60)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                field: "exercises[1]".to_string()
            }
        );

        // Volume fits, session-RPE scaling does not
        let near_limit = Decimal::MAX / dec!(4);
        let err = SessionLoadCalculator::rpe_load(near_limit, 10).unwrap_err();
        assert_eq!(err.to_string(), "exercises is too large");
    }

    #[test]
    fn test_context_tolerates_loads_near_limit() {
        let big = Decimal::MAX / dec!(2);
        let current = create_log(23, 10, big);
        let history = vec![create_log(22, 10, big), create_log(21, 10, big)];
        let context = SessionContext::evaluate(&current, &history, &WorkloadConfig::default());

        assert_eq!(context.sessions_last_7_days, 3);
        assert_eq!(context.acwr, dec!(1));
        assert!(!context.suggestions(&current, &WorkloadConfig::default()).recovery_focus);
    }

    #[test]
    fn test_context_without_history() {
        let current = create_log(23, 8, dec!(800));
        let config = WorkloadConfig::default();
        let context = SessionContext::evaluate(&current, &[current.clone()], &config);

        assert_eq!(context.sessions_last_7_days, 1);
        assert_eq!(context.avg_rpe_load_last_7_days, dec!(800));
        assert_eq!(context.load_trend, LoadTrend::InsufficientData);
        assert_eq!(context.acwr, dec!(1));

        let suggestions = context.suggestions(&current, &config);
        assert!(suggestions.tomorrow_doms_survey);
        assert!(!suggestions.recovery_focus);
        assert!(!suggestions.progression_ready);
    }

    #[test]
    fn test_context_with_history() {
        let current = create_log(23, 5, dec!(600));
        let history = vec![
            create_log(21, 6, dec!(400)),
            create_log(18, 6, dec!(500)),
            // Outside the acute window, inside the chronic one
            create_log(5, 6, dec!(100)),
        ];
        let config = WorkloadConfig::default();
        let context = SessionContext::evaluate(&current, &history, &config);

        assert_eq!(context.sessions_last_7_days, 3);
        assert_eq!(context.avg_rpe_load_last_7_days, dec!(500));
        assert_eq!(context.load_trend, LoadTrend::Increasing);
        // 500 / 400
        assert_eq!(context.acwr, dec!(1.25));

        let suggestions = context.suggestions(&current, &config);
        assert!(!suggestions.tomorrow_doms_survey);
        assert!(!suggestions.recovery_focus);
        assert!(!suggestions.progression_ready);
    }

    #[test]
    fn test_rest_week_lowers_trend() {
        let current = create_log(23, 4, dec!(200));
        let history = vec![create_log(22, 7, dec!(900))];
        let context = SessionContext::evaluate(&current, &history, &WorkloadConfig::default());
        assert_eq!(context.load_trend, LoadTrend::Decreasing);
        assert!(context.suggestions(&current, &WorkloadConfig::default()).progression_ready);
    }
}
