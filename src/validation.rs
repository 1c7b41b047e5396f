//! Payload validation
//!
//! Turns raw JSON payloads into validated domain values. Every check runs
//! before anything touches the store, so a rejected payload leaves no trace.

use crate::error::ValidationError;
use crate::models::{ExerciseEntry, ExerciseType, MuscleGroup, MuscleSoreness, RecoverySurvey};
use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Inclusive range for muscle and overall soreness
pub const SORENESS_RANGE: (i64, i64) = (0, 10);

/// Inclusive range for sleep, energy and motivation
pub const WELLNESS_RANGE: (i64, i64) = (1, 10);

/// Inclusive range for session RPE
pub const RPE_RANGE: (i64, i64) = (1, 10);

/// Session length assumed when the payload omits it
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Check that `value` lies in `[min, max]` and narrow it to a score
pub fn check_range(field: &str, value: i64, (min, max): (i64, i64)) -> Result<u8, ValidationError> {
    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max,
        value: value.to_string(),
    };
    if value < min || value > max {
        return Err(out_of_range());
    }
    u8::try_from(value).map_err(|_| out_of_range())
}

/// Require a non-blank user id
pub fn check_user_id(user_id: &str) -> Result<String, ValidationError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: "user_id".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Typed field access over a JSON object payload
pub struct PayloadReader<'a> {
    payload: &'a Map<String, Value>,
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a Map<String, Value>) -> Self {
        Self { payload }
    }

    /// First present, non-null value among `field` and its aliases
    fn lookup(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.payload.get(*name))
            .find(|value| !value.is_null())
    }

    pub fn optional_integer(&self, names: &[&str]) -> Result<Option<i64>, ValidationError> {
        let Some(value) = self.lookup(names) else {
            return Ok(None);
        };
        let wrong_type = || ValidationError::WrongType {
            field: names[0].to_string(),
            expected: "a whole number".to_string(),
        };

        if let Some(int) = value.as_i64() {
            return Ok(Some(int));
        }
        // 7.0 is accepted, 7.5 is not; `as` saturates, so 1e20 reaches the range check
        match value.as_f64() {
            Some(float) if float.fract() == 0.0 => Ok(Some(float as i64)),
            _ => Err(wrong_type()),
        }
    }

    pub fn required_integer(&self, names: &[&str]) -> Result<i64, ValidationError> {
        self.optional_integer(names)?
            .ok_or_else(|| ValidationError::MissingField {
                field: names[0].to_string(),
            })
    }

    pub fn optional_decimal(&self, names: &[&str]) -> Result<Option<Decimal>, ValidationError> {
        let Some(value) = self.lookup(names) else {
            return Ok(None);
        };
        value_to_decimal(value).map(Some).ok_or_else(|| ValidationError::WrongType {
            field: names[0].to_string(),
            expected: "a number".to_string(),
        })
    }

    pub fn optional_string(&self, names: &[&str]) -> Result<Option<String>, ValidationError> {
        match self.lookup(names) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ValidationError::WrongType {
                field: names[0].to_string(),
                expected: "a string".to_string(),
            }),
        }
    }

    /// Optional YYYY-MM-DD date, falling back to `default`
    pub fn date_or(&self, name: &str, default: NaiveDate) -> Result<NaiveDate, ValidationError> {
        match self.optional_string(&[name])? {
            None => Ok(default),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                ValidationError::InvalidDate {
                    field: name.to_string(),
                    value: raw,
                }
            }),
        }
    }

    pub fn optional_array(&self, names: &[&str]) -> Result<Option<&'a Vec<Value>>, ValidationError> {
        match self.lookup(names) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(ValidationError::WrongType {
                field: names[0].to_string(),
                expected: "an array".to_string(),
            }),
        }
    }
}

/// Convert a JSON number to an exact decimal
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(int) = number.as_i64() {
        return Some(Decimal::from(int));
    }
    let text = number.to_string();
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&text).ok())
        .or_else(|| number.as_f64().and_then(Decimal::from_f64))
}

/// Validates `submit_doms` payloads
pub struct SurveyValidator;

impl SurveyValidator {
    /// Build a survey from a payload; `today` is used when no date is given
    pub fn validate(
        user_id: &str,
        payload: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<RecoverySurvey, ValidationError> {
        let user_id = check_user_id(user_id)?;
        let reader = PayloadReader::new(payload);

        let mut muscles = MuscleSoreness::default();
        for group in MuscleGroup::ALL {
            let field = group.field_name();
            let raw = reader.required_integer(&[field])?;
            muscles.set(group, check_range(field, raw, SORENESS_RANGE)?);
        }

        let overall_soreness = check_range(
            "overall_soreness",
            reader.required_integer(&["overall_soreness"])?,
            SORENESS_RANGE,
        )?;
        let sleep_quality = check_range(
            "sleep_quality",
            reader.required_integer(&["sleep_quality"])?,
            WELLNESS_RANGE,
        )?;
        let energy_level = check_range(
            "energy_level",
            reader.required_integer(&["energy_level"])?,
            WELLNESS_RANGE,
        )?;
        let motivation = check_range(
            "motivation",
            reader.required_integer(&["motivation"])?,
            WELLNESS_RANGE,
        )?;

        Ok(RecoverySurvey {
            user_id,
            date: reader.date_or("date", today)?,
            muscles,
            overall_soreness,
            sleep_quality,
            energy_level,
            motivation,
            notes: non_blank(reader.optional_string(&["notes"])?),
        })
    }
}

/// Validated `log_session` payload, before load derivation
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInput {
    pub user_id: String,
    pub date: NaiveDate,
    pub session_rpe: u8,
    pub duration_minutes: Decimal,
    pub exercises: Vec<ExerciseEntry>,
    pub notes: Option<String>,
}

/// Validates `log_session` payloads
pub struct SessionValidator;

impl SessionValidator {
    pub fn validate(
        user_id: &str,
        payload: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<SessionInput, ValidationError> {
        let user_id = check_user_id(user_id)?;
        let reader = PayloadReader::new(payload);

        let session_rpe = check_range(
            "session_rpe",
            reader.required_integer(&["session_rpe"])?,
            RPE_RANGE,
        )?;

        let duration_minutes = reader
            .optional_decimal(&["duration_minutes", "workout_duration_minutes"])?
            .unwrap_or_else(|| Decimal::from(DEFAULT_DURATION_MINUTES));
        if duration_minutes <= Decimal::ZERO {
            return Err(ValidationError::NotPositive {
                field: "duration_minutes".to_string(),
            });
        }

        let exercises = match reader.optional_array(&["exercises", "exercises_completed"])? {
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| Self::validate_exercise(index, item))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(SessionInput {
            user_id,
            date: reader.date_or("date", today)?,
            session_rpe,
            duration_minutes,
            exercises,
            notes: non_blank(reader.optional_string(&["notes"])?),
        })
    }

    fn validate_exercise(index: usize, item: &Value) -> Result<ExerciseEntry, ValidationError> {
        let entry: ExerciseEntry =
            serde_json::from_value(item.clone()).map_err(|_| ValidationError::WrongType {
                field: format!("exercises[{}]", index),
                expected: "an object with numeric sets, avg_reps and avg_weight".to_string(),
            })?;

        let checks = [
            ("sets", entry.sets),
            ("avg_reps", entry.avg_reps),
            ("avg_weight", entry.avg_weight),
        ];
        for (name, value) in checks {
            if value < Decimal::ZERO {
                return Err(ValidationError::Negative {
                    field: format!("exercises[{}].{}", index, name),
                });
            }
        }

        Ok(entry)
    }
}

/// Validated `get_suggestion` payload
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionInput {
    pub user_id: String,
    pub current_load: Decimal,
    pub exercise_type: ExerciseType,
}

/// Validates `get_suggestion` payloads
pub struct SuggestionValidator;

impl SuggestionValidator {
    pub fn validate(
        user_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<SuggestionInput, ValidationError> {
        let user_id = check_user_id(user_id)?;
        let reader = PayloadReader::new(payload);

        let current_load = reader
            .optional_decimal(&["current_load"])?
            .unwrap_or(Decimal::ZERO);
        if current_load < Decimal::ZERO {
            return Err(ValidationError::Negative {
                field: "current_load".to_string(),
            });
        }

        let exercise_type = reader
            .optional_string(&["exercise_type"])?
            .map(|label| ExerciseType::from_label(&label))
            .unwrap_or_default();

        Ok(SuggestionInput {
            user_id,
            current_load,
            exercise_type,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
