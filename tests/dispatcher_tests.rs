use chrono::NaiveDate;
use serde_json::{json, Value};
use trainready::{DispatchResponse, Dispatcher, MemoryStore, TrainingStore};

/// End-to-end request handling over the in-memory store

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
}

fn today() -> NaiveDate {
    date(23)
}

fn create_dispatcher() -> Dispatcher<MemoryStore> {
    Dispatcher::new(MemoryStore::new())
}

fn survey_request(day: u32, overall: u8, sleep: u8, energy: u8, motivation: u8) -> Value {
    json!({
        "action": "submit_doms",
        "user_id": "test_athlete",
        "date": date(day).to_string(),
        "chest_soreness": 0,
        "back_soreness": 0,
        "legs_soreness": 0,
        "arms_soreness": 0,
        "shoulders_soreness": 0,
        "core_soreness": 0,
        "overall_soreness": overall,
        "sleep_quality": sleep,
        "energy_level": energy,
        "motivation": motivation,
    })
}

fn session_request(day: u32, rpe: u8, duration: u32) -> Value {
    json!({
        "action": "log_session",
        "user_id": "test_athlete",
        "date": date(day).to_string(),
        "session_rpe": rpe,
        "duration_minutes": duration,
        "exercises": [
            { "exercise_name": "Back Squat", "sets": 4, "avg_reps": 6, "avg_weight": 42.5 },
            { "name": "Bench Press", "sets": 3, "reps": 10, "weight": 20 },
        ],
    })
}

fn suggestion_request(current_load: u32, exercise_type: &str) -> Value {
    json!({
        "action": "get_suggestion",
        "user_id": "test_athlete",
        "current_load": current_load,
        "exercise_type": exercise_type,
    })
}

fn assert_ok(response: &DispatchResponse) {
    assert_eq!(response.status, 200, "unexpected body: {}", response.body);
}

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("not a number: {}", value))
}

#[test]
fn test_submit_doms_scores_and_stores_survey() {
    let dispatcher = create_dispatcher();
    let mut request = survey_request(23, 3, 8, 6, 9);
    for field in [
        "chest_soreness",
        "back_soreness",
        "legs_soreness",
        "arms_soreness",
        "shoulders_soreness",
        "core_soreness",
    ] {
        request[field] = json!(2);
    }
    request["notes"] = json!("slept well");

    let response = dispatcher.handle_on(&request, today());
    assert_ok(&response);

    let body = &response.body;
    assert_eq!(body["success"], true);
    assert_eq!(number(&body["readiness_score"]), 0.77);
    assert_eq!(body["recommendation"], "Good recovery. Moderate training recommended.");
    assert_eq!(
        body["recommendations"],
        json!(["Good recovery status - ready for normal training"])
    );
    assert_eq!(body["analysis"]["readiness_category"], "good");
    assert_eq!(body["analysis"]["dominant_soreness_areas"], json!([]));
    assert_eq!(body["analysis"]["trends"]["soreness_trend"], "stable");
    assert_eq!(body["training_guidance"]["recommended_intensity"], "moderate");
    assert_eq!(
        body["training_guidance"]["focus_areas"],
        json!(["strength", "progression"])
    );

    assert_eq!(body["survey"]["chest_soreness"], 2);
    assert_eq!(body["survey"]["date"], "2024-09-23");
    assert_eq!(body["survey"]["notes"], "slept well");
    assert!(body["survey"]["id"].is_string());

    let stored = dispatcher.store().find_survey("test_athlete", today()).unwrap();
    assert!(stored.is_some());
}

#[test]
fn test_resubmitting_a_survey_updates_it() {
    let dispatcher = create_dispatcher();
    let first = dispatcher.handle_on(&survey_request(23, 3, 4, 6, 6), today());
    let second = dispatcher.handle_on(&survey_request(23, 3, 9, 6, 6), today());
    assert_ok(&first);
    assert_ok(&second);

    assert_eq!(first.body["survey"]["id"], second.body["survey"]["id"]);
    assert_eq!(second.body["survey"]["sleep_quality"], 9);

    let rows = dispatcher
        .store()
        .surveys_between("test_athlete", date(1), date(30), 10)
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_out_of_range_survey_is_rejected_without_writing() {
    let dispatcher = create_dispatcher();

    let response = dispatcher.handle_on(&survey_request(23, 3, 11, 6, 6), today());
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({ "error": "sleep_quality must be between 1 and 10 (got 11)" })
    );

    let mut negative = survey_request(23, 3, 8, 6, 6);
    negative["chest_soreness"] = json!(-1);
    let response = dispatcher.handle_on(&negative, today());
    assert_eq!(
        response.body["error"],
        "chest_soreness must be between 0 and 10 (got -1)"
    );

    assert!(dispatcher.store().find_survey("test_athlete", today()).unwrap().is_none());
}

#[test]
fn test_missing_survey_field_is_named() {
    let dispatcher = create_dispatcher();
    let mut request = survey_request(23, 3, 8, 6, 6);
    request.as_object_mut().unwrap().remove("motivation");

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "motivation is required");
}

#[test]
fn test_invalid_date_is_rejected() {
    let dispatcher = create_dispatcher();
    let mut request = survey_request(23, 3, 8, 6, 6);
    request["date"] = json!("2024-13-01");

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    assert!(response.body["error"].as_str().unwrap().contains("2024-13-01"));
}

#[test]
fn test_survey_trends_follow_history() {
    let dispatcher = create_dispatcher();
    let history = [
        (18, (7, 4, 4, 4)),
        (19, (6, 4, 4, 4)),
        (20, (5, 5, 5, 5)),
        (21, (3, 7, 7, 7)),
        (22, (2, 8, 8, 8)),
        (23, (2, 8, 8, 8)),
    ];

    let mut last = None;
    for (day, (overall, sleep, energy, motivation)) in history {
        let response =
            dispatcher.handle_on(&survey_request(day, overall, sleep, energy, motivation), date(day));
        assert_ok(&response);
        last = Some(response);
    }

    let trends = &last.unwrap().body["analysis"]["trends"];
    assert_eq!(trends["soreness_trend"], "improving");
    assert_eq!(trends["sleep_trend"], "improving");
    assert_eq!(trends["energy_trend"], "improving");
    assert_eq!(trends["motivation_trend"], "improving");
}

#[test]
fn test_high_soreness_survey_recommends_rest() {
    let dispatcher = create_dispatcher();
    let mut request = survey_request(23, 9, 3, 3, 3);
    request["legs_soreness"] = json!(8);

    let response = dispatcher.handle_on(&request, today());
    assert_ok(&response);

    let recommendations = response.body["recommendations"].as_array().unwrap();
    assert!(recommendations.contains(&json!("Take a full rest day - very high overall soreness")));
    assert!(recommendations.contains(&json!("Avoid training legs today - high soreness detected")));
    assert_eq!(response.body["analysis"]["dominant_soreness_areas"], json!(["legs"]));
    assert_eq!(
        response.body["training_guidance"]["focus_areas"],
        json!(["recovery", "mobility"])
    );
}

#[test]
fn test_log_session_derives_loads() {
    let dispatcher = create_dispatcher();

    // (4 x 6 x 42.5) + (3 x 10 x 20) = 1620, x 1.5 for 90 minutes
    let response = dispatcher.handle_on(&session_request(23, 8, 90), today());
    assert_ok(&response);

    let body = &response.body;
    assert_eq!(number(&body["total_load"]), 2430.0);
    assert_eq!(number(&body["rpe_load"]), 19440.0);
    assert_eq!(body["calculated_metrics"]["exercise_count"], 2);
    assert_eq!(number(&body["calculated_metrics"]["duration_minutes"]), 90.0);
    assert_eq!(body["session"]["session_rpe"], 8);

    assert_eq!(body["context"]["sessions_last_7_days"], 1);
    assert_eq!(body["context"]["load_trend"], "insufficient_data");
    assert_eq!(number(&body["context"]["acwr"]), 1.0);
    assert_eq!(body["suggestions"]["tomorrow_doms_survey"], true);
    assert_eq!(body["suggestions"]["recovery_focus"], false);
    assert_eq!(body["suggestions"]["progression_ready"], false);
}

#[test]
fn test_log_session_context_uses_recent_history() {
    let dispatcher = create_dispatcher();
    assert_ok(&dispatcher.handle_on(&session_request(21, 6, 60), date(21)));

    let response = dispatcher.handle_on(&session_request(23, 8, 90), today());
    assert_ok(&response);

    let context = &response.body["context"];
    assert_eq!(context["sessions_last_7_days"], 2);
    assert_eq!(number(&context["avg_rpe_load_last_7_days"]), 14580.0);
    assert_eq!(context["load_trend"], "increasing");
    // 19440 > 1.2 x 14580
    assert_eq!(response.body["suggestions"]["recovery_focus"], true);
}

#[test]
fn test_session_defaults_duration_and_rejects_bad_rpe() {
    let dispatcher = create_dispatcher();

    let mut request = session_request(23, 5, 60);
    request.as_object_mut().unwrap().remove("duration_minutes");
    let response = dispatcher.handle_on(&request, today());
    assert_ok(&response);
    assert_eq!(number(&response.body["calculated_metrics"]["duration_minutes"]), 60.0);
    assert_eq!(number(&response.body["total_load"]), 1620.0);

    let response = dispatcher.handle_on(&session_request(22, 0, 60), today());
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body["error"],
        "session_rpe must be between 1 and 10 (got 0)"
    );
    assert!(dispatcher.store().find_session("test_athlete", date(22)).unwrap().is_none());
}

#[test]
fn test_suggestion_without_history() {
    let dispatcher = create_dispatcher();
    let response = dispatcher.handle_on(&suggestion_request(100, "compound"), today());
    assert_ok(&response);

    let body = &response.body;
    assert_eq!(number(&body["suggested_load"]), 103.0);
    assert_eq!(number(&body["readiness_index"]), 0.5);
    assert_eq!(body["rule"], "standard_progression");
    assert_eq!(body["reason"], "Standard progression (+2.5%)");
    assert!(body["recent_rpe"].is_null());
    assert_eq!(body["recovery_metrics"]["defaults_used"], true);
    assert_eq!(body["recovery_metrics"]["sleep"], 5);
}

#[test]
fn test_starting_weight_by_exercise_type() {
    let dispatcher = create_dispatcher();

    let compound = dispatcher.handle_on(&suggestion_request(0, "compound"), today());
    assert_eq!(number(&compound.body["suggested_load"]), 20.0);

    let isolation = dispatcher.handle_on(&suggestion_request(0, "isolation"), today());
    assert_eq!(number(&isolation.body["suggested_load"]), 10.0);
    assert_eq!(isolation.body["rule"], "starting_weight");

    let mut default_type = suggestion_request(0, "compound");
    default_type.as_object_mut().unwrap().remove("exercise_type");
    let response = dispatcher.handle_on(&default_type, today());
    assert_eq!(number(&response.body["suggested_load"]), 20.0);
}

#[test]
fn test_excellent_recovery_with_easy_sessions() {
    let dispatcher = create_dispatcher();
    assert_ok(&dispatcher.handle_on(&survey_request(22, 1, 8, 8, 8), date(22)));
    assert_ok(&dispatcher.handle_on(&session_request(21, 6, 60), date(21)));

    let response = dispatcher.handle_on(&suggestion_request(100, "compound"), today());
    assert_ok(&response);

    let body = &response.body;
    assert_eq!(number(&body["readiness_index"]), 0.87);
    assert_eq!(number(&body["suggested_load"]), 105.0);
    assert_eq!(body["rule"], "excellent_recovery");
    assert_eq!(number(&body["recent_rpe"]), 6.0);
    assert_eq!(body["recovery_metrics"]["defaults_used"], false);
}

#[test]
fn test_high_soreness_forces_deload() {
    let dispatcher = create_dispatcher();
    assert_ok(&dispatcher.handle_on(&survey_request(23, 9, 10, 10, 10), today()));

    let response = dispatcher.handle_on(&suggestion_request(100, "compound"), today());
    assert_eq!(number(&response.body["suggested_load"]), 90.0);
    assert_eq!(response.body["rule"], "poor_recovery");
    assert_eq!(response.body["recovery_metrics"]["soreness"], 9);
}

#[test]
fn test_stale_survey_is_ignored() {
    let dispatcher = create_dispatcher();
    assert_ok(&dispatcher.handle_on(&survey_request(10, 9, 2, 2, 2), date(10)));

    let response = dispatcher.handle_on(&suggestion_request(100, "compound"), today());
    assert_eq!(number(&response.body["suggested_load"]), 103.0);
    assert_eq!(response.body["rule"], "standard_progression");
}

#[test]
fn test_negative_load_is_rejected() {
    let dispatcher = create_dispatcher();
    let mut request = suggestion_request(0, "compound");
    request["current_load"] = json!(-5);

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "current_load must not be negative");
}

#[test]
fn test_oversized_session_volume_is_rejected() {
    let dispatcher = create_dispatcher();
    let mut request = session_request(23, 5, 60);
    request["exercises"] = json!([{ "sets": 1e10, "avg_reps": 1e10, "avg_weight": 1e10 }]);

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "exercises[0] is too large");
    assert!(dispatcher.store().find_session("test_athlete", today()).unwrap().is_none());
}

#[test]
fn test_oversized_current_load_is_rejected() {
    let dispatcher = create_dispatcher();
    let mut request = suggestion_request(0, "compound");
    request["current_load"] = json!(7.9e28);

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "current_load is too large");
}

#[test]
fn test_huge_score_reports_range() {
    let dispatcher = create_dispatcher();
    let mut request = survey_request(23, 3, 8, 6, 9);
    request["sleep_quality"] = json!(1e20);

    let response = dispatcher.handle_on(&request, today());
    assert_eq!(response.status, 400);
    let message = response.body["error"].as_str().unwrap();
    assert!(message.starts_with("sleep_quality must be between 1 and 10"), "{}", message);
}
