//! Request dispatcher
//!
//! Single HTTP-style entry point. A request is one flat JSON object carrying
//! `user_id`, `action` and the action's fields:
//!
//! - `submit_doms`: validate, upsert the survey, score readiness, generate
//!   recommendations and trends.
//! - `log_session`: validate, derive loads, upsert the session, put it in
//!   workload context.
//! - `get_suggestion`: read recent history and run the progression table.
//!
//! `user_id` is checked before `action`. Every failure becomes a
//! `{ "error": message }` body with a 400 or 500 status.

use crate::error::{ErrorSeverity, Result, TrainReadyError};
use crate::models::{MuscleGroup, StoredSession, StoredSurvey};
use crate::progression::{ProgressionConfig, ProgressionInputs, ProgressionSuggester, ProgressionSuggestion};
use crate::readiness::{FocusArea, ReadinessCalculator, TrainingIntensity};
use crate::recommendations::{RecommendationGenerator, RecommendationThresholds};
use crate::session_load::{
    window_start, SessionContext, SessionLoadCalculator, SessionSuggestions, WorkloadConfig,
};
use crate::store::TrainingStore;
use crate::trends::{RecoveryTrends, TrendAnalyzer, TrendConfig};
use crate::validation::{SessionValidator, SuggestionValidator, SurveyValidator};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Supported request actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitDoms,
    LogSession,
    GetSuggestion,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "submit_doms" => Some(Action::SubmitDoms),
            "log_session" => Some(Action::LogSession),
            "get_suggestion" => Some(Action::GetSuggestion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SubmitDoms => "submit_doms",
            Action::LogSession => "log_session",
            Action::GetSuggestion => "get_suggestion",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus JSON body, as an HTTP handler would return them
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: Value,
}

impl DispatchResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn from_error(err: &TrainReadyError) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(err.user_message()));
        Self {
            status: err.status_code(),
            body: Value::Object(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `analysis` block of a survey response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyAnalysis {
    pub readiness_category: String,
    pub dominant_soreness_areas: Vec<MuscleGroup>,
    pub trends: RecoveryTrends,
}

/// `training_guidance` block of a survey response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingGuidance {
    pub recommended_intensity: TrainingIntensity,
    pub focus_areas: Vec<FocusArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub success: bool,
    pub survey: StoredSurvey,
    pub readiness_score: Decimal,
    /// Tier message
    pub recommendation: String,
    pub recommendations: Vec<String>,
    pub analysis: SurveyAnalysis,
    pub training_guidance: TrainingGuidance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedMetrics {
    pub total_load: Decimal,
    pub rpe_load: Decimal,
    pub duration_minutes: Decimal,
    pub exercise_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: StoredSession,
    pub total_load: Decimal,
    pub rpe_load: Decimal,
    pub calculated_metrics: CalculatedMetrics,
    pub context: SessionContext,
    pub suggestions: SessionSuggestions,
}

/// Routes requests to the engine components over a training store
pub struct Dispatcher<S: TrainingStore> {
    store: S,
    recommendations: RecommendationGenerator,
    trends: TrendAnalyzer,
    progression: ProgressionSuggester,
    workload: WorkloadConfig,
}

impl<S: TrainingStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(
            store,
            ProgressionConfig::default(),
            TrendConfig::default(),
            WorkloadConfig::default(),
        )
    }

    pub fn with_config(
        store: S,
        progression: ProgressionConfig,
        trends: TrendConfig,
        workload: WorkloadConfig,
    ) -> Self {
        Self {
            store,
            recommendations: RecommendationGenerator::new(),
            trends: TrendAnalyzer::with_config(trends),
            progression: ProgressionSuggester::with_config(progression),
            workload,
        }
    }

    /// Replace the default recommendation thresholds
    pub fn with_recommendation_thresholds(mut self, thresholds: RecommendationThresholds) -> Self {
        self.recommendations = RecommendationGenerator::with_thresholds(thresholds);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one request against the local calendar date
    pub fn handle(&self, request: &Value) -> DispatchResponse {
        self.handle_on(request, Local::now().date_naive())
    }

    /// Handle one request with `today` pinned
    pub fn handle_on(&self, request: &Value, today: NaiveDate) -> DispatchResponse {
        match self.dispatch(request, today) {
            Ok(body) => DispatchResponse::ok(body),
            Err(err) => {
                match err.severity() {
                    ErrorSeverity::Warning => warn!(error = %err, "Request rejected"),
                    ErrorSeverity::Error | ErrorSeverity::Critical => {
                        error!(error = %err, "Request failed")
                    }
                }
                DispatchResponse::from_error(&err)
            }
        }
    }

    fn dispatch(&self, request: &Value, today: NaiveDate) -> Result<Value> {
        let payload = request.as_object().ok_or_else(|| {
            TrainReadyError::InvalidRequest("request body must be a JSON object".to_string())
        })?;

        let user_id = payload
            .get("user_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(TrainReadyError::MissingUserId)?;

        let action = match payload.get("action") {
            None | Some(Value::Null) => return Err(TrainReadyError::MissingAction),
            Some(Value::String(name)) => Action::parse(name)
                .ok_or_else(|| TrainReadyError::UnknownAction(name.clone()))?,
            Some(other) => return Err(TrainReadyError::UnknownAction(other.to_string())),
        };

        debug!(%action, user_id, "Dispatching request");

        let body = match action {
            Action::SubmitDoms => serde_json::to_value(self.submit_doms(user_id, payload, today)?)?,
            Action::LogSession => serde_json::to_value(self.log_session(user_id, payload, today)?)?,
            Action::GetSuggestion => {
                serde_json::to_value(self.get_suggestion(user_id, payload, today)?)?
            }
        };

        Ok(body)
    }

    /// Store a DOMS survey and score it
    #[instrument(skip(self, payload), fields(action = "submit_doms"))]
    pub fn submit_doms(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<SurveyResponse> {
        let survey = SurveyValidator::validate(user_id, payload, today)?;
        let stored = self.store.upsert_survey(&survey)?;

        let assessment = ReadinessCalculator::assess(&stored.record);
        let recommendations = self.recommendations.generate(&stored.record);

        let trend_config = self.trends.config();
        let history: Vec<_> = self
            .store
            .surveys_between(
                &survey.user_id,
                window_start(survey.date, trend_config.lookback_days),
                survey.date,
                trend_config.max_surveys,
            )?
            .into_iter()
            .map(|row| row.record)
            .collect();
        let trends = self.trends.analyze(&history);

        info!(
            survey_id = %stored.id,
            date = %survey.date,
            readiness = %assessment.readiness_score,
            "DOMS survey recorded"
        );

        Ok(SurveyResponse {
            success: true,
            readiness_score: assessment.readiness_score,
            recommendation: assessment.tier.recommendation().to_string(),
            recommendations,
            analysis: SurveyAnalysis {
                readiness_category: assessment.tier.category().to_string(),
                dominant_soreness_areas: assessment.dominant_soreness_areas,
                trends,
            },
            training_guidance: TrainingGuidance {
                recommended_intensity: assessment.recommended_intensity,
                focus_areas: assessment.focus_areas,
            },
            survey: stored,
        })
    }

    /// Store a session log with its derived loads
    #[instrument(skip(self, payload), fields(action = "log_session"))]
    pub fn log_session(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<SessionResponse> {
        let input = SessionValidator::validate(user_id, payload, today)?;
        let log = SessionLoadCalculator::build_log(&input)?;
        let stored = self.store.upsert_session(&log)?;

        let history: Vec<_> = self
            .store
            .sessions_between(
                &log.user_id,
                window_start(log.date, self.workload.chronic_days),
                log.date,
            )?
            .into_iter()
            .map(|row| row.record)
            .collect();

        let context = SessionContext::evaluate(&stored.record, &history, &self.workload);
        let suggestions = context.suggestions(&stored.record, &self.workload);

        info!(
            session_id = %stored.id,
            date = %log.date,
            rpe_load = %log.rpe_load,
            "Session logged"
        );

        Ok(SessionResponse {
            success: true,
            total_load: log.total_load,
            rpe_load: log.rpe_load,
            calculated_metrics: CalculatedMetrics {
                total_load: log.total_load,
                rpe_load: log.rpe_load,
                duration_minutes: log.duration_minutes,
                exercise_count: log.exercise_count,
            },
            context,
            suggestions,
            session: stored,
        })
    }

    /// Suggest the next load from the latest survey and recent sessions
    #[instrument(skip(self, payload), fields(action = "get_suggestion"))]
    pub fn get_suggestion(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<ProgressionSuggestion> {
        let input = SuggestionValidator::validate(user_id, payload)?;
        let config = self.progression.config();

        let survey = self
            .store
            .latest_survey(
                &input.user_id,
                window_start(today, config.survey_lookback_days),
                today,
            )?
            .map(|row| row.record);

        let sessions: Vec<_> = self
            .store
            .sessions_between(&input.user_id, window_start(today, config.rpe_window_days), today)?
            .into_iter()
            .map(|row| row.record)
            .collect();

        let suggestion = self.progression.suggest(ProgressionInputs {
            current_load: input.current_load,
            exercise_type: input.exercise_type,
            survey: survey.as_ref(),
            recent_rpe: ProgressionSuggester::average_rpe(&sessions),
        })?;

        info!(
            rule = ?suggestion.rule,
            suggested_load = %suggestion.suggested_load,
            "Progression suggested"
        );

        Ok(suggestion)
    }
}
