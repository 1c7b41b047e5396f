use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Muscle groups covered by the daily DOMS survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Arms,
    Shoulders,
    Core,
}

impl MuscleGroup {
    /// Survey order; recommendations and reports list muscles in this order
    pub const ALL: [MuscleGroup; 6] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Legs,
        MuscleGroup::Arms,
        MuscleGroup::Shoulders,
        MuscleGroup::Core,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Arms => "arms",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Core => "core",
        }
    }

    /// Payload/column name of this group's soreness score
    pub fn field_name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest_soreness",
            MuscleGroup::Back => "back_soreness",
            MuscleGroup::Legs => "legs_soreness",
            MuscleGroup::Arms => "arms_soreness",
            MuscleGroup::Shoulders => "shoulders_soreness",
            MuscleGroup::Core => "core_soreness",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-muscle soreness, each 0-10 (0 = no soreness)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuscleSoreness {
    #[serde(rename = "chest_soreness")]
    pub chest: u8,
    #[serde(rename = "back_soreness")]
    pub back: u8,
    #[serde(rename = "legs_soreness")]
    pub legs: u8,
    #[serde(rename = "arms_soreness")]
    pub arms: u8,
    #[serde(rename = "shoulders_soreness")]
    pub shoulders: u8,
    #[serde(rename = "core_soreness")]
    pub core: u8,
}

impl MuscleSoreness {
    pub fn get(&self, group: MuscleGroup) -> u8 {
        match group {
            MuscleGroup::Chest => self.chest,
            MuscleGroup::Back => self.back,
            MuscleGroup::Legs => self.legs,
            MuscleGroup::Arms => self.arms,
            MuscleGroup::Shoulders => self.shoulders,
            MuscleGroup::Core => self.core,
        }
    }

    pub fn set(&mut self, group: MuscleGroup, value: u8) {
        match group {
            MuscleGroup::Chest => self.chest = value,
            MuscleGroup::Back => self.back = value,
            MuscleGroup::Legs => self.legs = value,
            MuscleGroup::Arms => self.arms = value,
            MuscleGroup::Shoulders => self.shoulders = value,
            MuscleGroup::Core => self.core = value,
        }
    }

    /// Scores in survey order
    pub fn iter(&self) -> impl Iterator<Item = (MuscleGroup, u8)> + '_ {
        MuscleGroup::ALL.iter().map(move |&group| (group, self.get(group)))
    }

    /// Mean of the six muscle scores
    pub fn average(&self) -> Decimal {
        let total: u32 = self.iter().map(|(_, score)| u32::from(score)).sum();
        Decimal::from(total) / Decimal::from(MuscleGroup::ALL.len() as u32)
    }

    /// Groups scoring at or above `threshold`, in survey order
    pub fn at_or_above(&self, threshold: u8) -> Vec<MuscleGroup> {
        self.iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(group, _)| group)
            .collect()
    }
}

/// One athlete's recovery survey for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverySurvey {
    pub user_id: String,

    pub date: NaiveDate,

    #[serde(flatten)]
    pub muscles: MuscleSoreness,

    /// Whole-body soreness, 0-10
    pub overall_soreness: u8,

    /// 1-10, higher is better
    pub sleep_quality: u8,

    /// 1-10, higher is better
    pub energy_level: u8,

    /// 1-10, higher is better
    pub motivation: u8,

    pub notes: Option<String>,
}

/// How an exercise is loaded; decides the starting weight for new lifts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    #[default]
    Compound,
    Isolation,
}

impl ExerciseType {
    /// Anything other than "compound" is treated as isolation work.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("compound") {
            ExerciseType::Compound
        } else {
            ExerciseType::Isolation
        }
    }
}

/// A completed exercise inside a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    #[serde(default, alias = "name")]
    pub exercise_name: Option<String>,

    #[serde(default)]
    pub sets: Decimal,

    /// Average reps per set
    #[serde(default, alias = "reps")]
    pub avg_reps: Decimal,

    /// Average weight per rep
    #[serde(default, alias = "weight")]
    pub avg_weight: Decimal,
}

/// One athlete's logged training session for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub user_id: String,

    pub date: NaiveDate,

    /// Session rating of perceived exertion, 1-10
    pub session_rpe: u8,

    pub duration_minutes: Decimal,

    /// Volume load scaled by session duration
    pub total_load: Decimal,

    /// total_load x session_rpe (Foster)
    pub rpe_load: Decimal,

    /// Distinct exercises performed
    pub exercise_count: u32,

    pub notes: Option<String>,
}

/// A record as held by the store, with store-managed identity and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord<T> {
    pub id: String,

    #[serde(flatten)]
    pub record: T,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

pub type StoredSurvey = StoredRecord<RecoverySurvey>;
pub type StoredSession = StoredRecord<SessionLog>;

/// Raw recovery inputs echoed back with a progression suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMetrics {
    pub sleep: u8,
    pub energy: u8,
    pub soreness: u8,
    pub motivation: u8,

    /// True when no survey was available and neutral placeholders were used
    pub defaults_used: bool,
}

impl RecoveryMetrics {
    /// Neutral value reported for each metric when there is no survey
    pub const NEUTRAL: u8 = 5;

    pub fn from_survey(survey: &RecoverySurvey) -> Self {
        RecoveryMetrics {
            sleep: survey.sleep_quality,
            energy: survey.energy_level,
            soreness: survey.overall_soreness,
            motivation: survey.motivation,
            defaults_used: false,
        }
    }

    pub fn neutral() -> Self {
        RecoveryMetrics {
            sleep: Self::NEUTRAL,
            energy: Self::NEUTRAL,
            soreness: Self::NEUTRAL,
            motivation: Self::NEUTRAL,
            defaults_used: true,
        }
    }
}
