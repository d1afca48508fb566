//! Sample requests and model replies.

use chrono::NaiveDate;
use serde_json::{Value, json};

use runplan_core::TrainingMethod;
use runplan_core::request::{
    ExperienceLevel, Focus, Goal, Language, PlanningMode, RecentPerformance, ScheduleRequest,
};

/// A 10 km, 10 week, balanced-method request.
pub fn sample_request() -> ScheduleRequest {
    ScheduleRequest {
        goal: Goal::TenK,
        focus: Focus::Recreational,
        target_time: None,
        experience: ExperienceLevel::Intermediate,
        weekly_frequency: "2-3".to_string(),
        health_status: "no injuries".to_string(),
        recent_performance: Some(RecentPerformance {
            distance: "5 km".to_string(),
            time: "27:30".to_string(),
        }),
        start_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap_or_default(),
        training_days_per_week: 3,
        training_weeks: 10,
        planning_mode: PlanningMode::Auto,
        selected_days: Vec::new(),
        language: Language::Nl,
        gender: None,
        age_bracket: Some("40-49".to_string()),
        training_method: Some(TrainingMethod::Gebalanceerd),
    }
}

/// A schedule object with `weeks` weeks of three days each, every day using
/// the free-form `intensity` text. Week numbers, summaries and profile are
/// left out so the validator has to fill them in.
pub fn sample_schedule_json(weeks: usize, intensity: &str) -> Value {
    let weeks: Vec<Value> = (0..weeks)
        .map(|w| {
            json!({
                "focus": format!("Week {} {{opbouw}}", w + 1),
                "days": [
                    { "day": "maandag", "type": "Duurloop", "description": "Rustig lopen", "intensity": intensity, "duration": "30 min", "distance": "5 km" },
                    { "day": "woensdag", "type": "Interval", "description": "4 x 400 m", "intensity": intensity, "duration": "40 min", "distance": "6 km" },
                    { "day": "zaterdag", "type": "Lange duurloop", "description": "Lang en rustig", "intensity": intensity, "duration": "50 min", "distance": "8 km" }
                ]
            })
        })
        .collect();
    json!({
        "title": "10 km schema",
        "overview": "Tien weken opbouw naar 10 km.",
        "weeks": weeks
    })
}

/// [`sample_schedule_json`] wrapped the way models usually answer: prose,
/// a fenced block, more prose.
pub fn sample_reply(weeks: usize, intensity: &str) -> String {
    let body = serde_json::to_string_pretty(&sample_schedule_json(weeks, intensity))
        .unwrap_or_default();
    format!("Hier is je schema:\n\n```json\n{body}\n```\n\nSucces met trainen!")
}
