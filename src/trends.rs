//! Recovery trend analysis
//!
//! Compares the mean of the most recent surveys with the mean of the oldest
//! surveys in a short window. With fewer than six rows the two windows
//! overlap; that is expected with sparse data.

use crate::models::RecoverySurvey;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Direction a recovery metric is moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

/// Trend per tracked metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTrends {
    pub soreness_trend: TrendDirection,
    pub sleep_trend: TrendDirection,
    pub energy_trend: TrendDirection,
    pub motivation_trend: TrendDirection,
}

impl RecoveryTrends {
    pub fn stable() -> Self {
        RecoveryTrends {
            soreness_trend: TrendDirection::Stable,
            sleep_trend: TrendDirection::Stable,
            energy_trend: TrendDirection::Stable,
            motivation_trend: TrendDirection::Stable,
        }
    }
}

/// Trend window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Calendar days of surveys considered
    pub lookback_days: u32,

    /// Maximum surveys read from the window
    pub max_surveys: usize,

    /// Rows in each of the recent/older windows; also the minimum history
    pub window_size: usize,

    /// Mean difference that counts as movement
    pub dead_band: Decimal,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            lookback_days: 7,
            max_surveys: 7,
            window_size: 3,
            dead_band: dec!(0.5),
        }
    }
}

/// Trend analysis engine
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new() -> Self {
        TrendAnalyzer {
            config: TrendConfig::default(),
        }
    }

    pub fn with_config(config: TrendConfig) -> Self {
        TrendAnalyzer { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Classify each metric; `surveys` must be ordered newest first
    pub fn analyze(&self, surveys: &[RecoverySurvey]) -> RecoveryTrends {
        let surveys = &surveys[..surveys.len().min(self.config.max_surveys)];
        let window = self.config.window_size;

        if window == 0 || surveys.len() < window {
            return RecoveryTrends::stable();
        }

        let recent = &surveys[..window];
        let older = &surveys[surveys.len() - window..];

        let compare = |metric: fn(&RecoverySurvey) -> u8, lower_is_better: bool| {
            self.direction(mean(recent, metric), mean(older, metric), lower_is_better)
        };

        RecoveryTrends {
            soreness_trend: compare(|s| s.overall_soreness, true),
            sleep_trend: compare(|s| s.sleep_quality, false),
            energy_trend: compare(|s| s.energy_level, false),
            motivation_trend: compare(|s| s.motivation, false),
        }
    }

    fn direction(&self, recent: Decimal, older: Decimal, lower_is_better: bool) -> TrendDirection {
        let band = self.config.dead_band;
        let (better, worse) = if lower_is_better {
            (recent < older - band, recent > older + band)
        } else {
            (recent > older + band, recent < older - band)
        };

        if better {
            TrendDirection::Improving
        } else if worse {
            TrendDirection::Worsening
        } else {
            TrendDirection::Stable
        }
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(surveys: &[RecoverySurvey], metric: fn(&RecoverySurvey) -> u8) -> Decimal {
    let total: u32 = surveys.iter().map(|s| u32::from(metric(s))).sum();
    Decimal::from(total) / Decimal::from(surveys.len() as u32)
}
