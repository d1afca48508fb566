//! Prompt construction for schedule generation.
//!
//! Pure logic: the same request always yields the same prompt. Optional
//! fields that were left empty are written out as a placeholder instead of
//! being omitted, so every prompt has the same sections in the same order.

use chrono::Datelike;

use crate::method::{self, TrainingMethod};
use crate::request::{PlanningMode, ScheduleRequest, Weekday};
use crate::schedule::Intensity;

/// Placeholder for answers the runner did not give.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for optional preferences the runner did not express.
pub const NO_PREFERENCE: &str = "no preference";

/// JSON shape the model must return, embedded verbatim.
const SCHEDULE_SHAPE: &str = r#"## Output Format

Return ONLY one JSON object with exactly this shape. No markdown, no text before or after it.

```json
{
  "title": "string",
  "overview": "string",
  "runnerProfile": {
    "experience": "string",
    "currentFitness": "string",
    "healthStatus": "string",
    "trainingHistory": "string",
    "strengths": ["string"],
    "considerations": ["string"],
    "motivation": "string"
  },
  "summary": {
    "goal": "string",
    "targetDistance": "string",
    "duration": "string",
    "trainingMethod": "string",
    "totalWeeks": 0,
    "coachStrategy": "string"
  },
  "weeks": [
    {
      "weekNumber": 1,
      "focus": "string",
      "weekSummary": {
        "totalDistance": "string",
        "totalDuration": "string",
        "trainingDays": 0
      },
      "days": [
        {
          "day": "string",
          "date": "YYYY-MM-DD",
          "type": "string",
          "description": "string",
          "intensity": "VeryLight | Light | Moderate | Heavy | VeryHeavy | Peak",
          "duration": "string, e.g. \"45 min\" or \"45-50 min\"",
          "distance": "string, e.g. \"8 km\" or \"8-9 km\"",
          "workoutDetails": {
            "warmup": { "description": "string", "duration": "string", "distance": "string" },
            "interval": { "reps": 0, "distance": "string", "duration": "string", "targetPace": "string", "recovery": "string" },
            "mainBody": { "description": "string", "duration": "string", "distance": "string" },
            "strides": { "count": 0, "description": "string" },
            "cooldown": { "description": "string", "duration": "string", "distance": "string" },
            "technicalData": { "rpe": 1, "trainingEffect": "string", "surface": "string" }
          }
        }
      ]
    }
  ]
}
```

Every part of `workoutDetails` except `technicalData` is optional; include only the parts the session has.
"#;

/// Guidance for each canonical intensity, in ascending order.
const INTENSITY_GUIDANCE: &[(Intensity, &str)] = &[
    (
        Intensity::VeryLight,
        "recovery jogs, warm-ups and cool-downs; RPE 1-2; zone 1",
    ),
    (
        Intensity::Light,
        "easy and long runs at conversational pace; RPE 3-4; zone 2",
    ),
    (
        Intensity::Moderate,
        "steady runs and marathon pace; RPE 5-6; zone 3",
    ),
    (
        Intensity::Heavy,
        "tempo and threshold work; RPE 7; zone 4",
    ),
    (
        Intensity::VeryHeavy,
        "VO2max intervals and hill repeats; RPE 8-9; zone 5",
    ),
    (
        Intensity::Peak,
        "race-pace efforts, sprints and races; RPE 10",
    ),
];

/// Cross-field rule the model must respect inside each day.
const CONSISTENCY_RULE: &str = "A day's `duration` and `distance` describe the WHOLE session including warm-up and cool-down. \
When `workoutDetails` has segments, the day's `duration` must equal the sum of the segment durations and the day's \
`distance` must equal the sum of the segment distances (for intervals: reps times the per-rep value plus recoveries).";

/// Build the generation prompt for a request.
pub fn build_prompt(request: &ScheduleRequest) -> String {
    let mut prompt = String::with_capacity(8192);
    let language = request.language;

    prompt.push_str("# Running Coach\n\n");
    prompt.push_str(
        "You are an experienced running coach. Create a personal, week-by-week \
         training schedule for the runner described below. The schedule must be \
         safe for the runner's experience and health, and build progressively \
         towards the goal.\n\n",
    );

    // Runner.
    prompt.push_str("## Runner\n\n");
    prompt.push_str(&format!("- Goal: {}\n", request.goal));
    prompt.push_str(&format!("- Focus: {}\n", request.focus));
    prompt.push_str(&format!(
        "- Target time: {}\n",
        or_placeholder(request.target_time.as_deref(), NO_PREFERENCE)
    ));
    prompt.push_str(&format!("- Experience: {}\n", request.experience));
    prompt.push_str(&format!(
        "- Current runs per week: {}\n",
        or_placeholder(Some(&request.weekly_frequency), UNKNOWN)
    ));
    prompt.push_str(&format!(
        "- Health and injuries: {}\n",
        or_placeholder(Some(&request.health_status), UNKNOWN)
    ));
    match &request.recent_performance {
        Some(perf) if !perf.distance.trim().is_empty() && !perf.time.trim().is_empty() => {
            prompt.push_str(&format!(
                "- Recent performance: {} in {}\n",
                perf.distance.trim(),
                perf.time.trim()
            ));
        }
        _ => prompt.push_str(&format!("- Recent performance: {UNKNOWN}\n")),
    }
    match request.gender {
        Some(g) => prompt.push_str(&format!("- Gender: {g}\n")),
        None => prompt.push_str(&format!("- Gender: {UNKNOWN}\n")),
    }
    prompt.push_str(&format!(
        "- Age: {}\n\n",
        or_placeholder(request.age_bracket.as_deref(), UNKNOWN)
    ));

    // Schedule constraints.
    let start = request.start_date;
    prompt.push_str("## Schedule\n\n");
    prompt.push_str(&format!(
        "- Length: {} weeks. The `weeks` array must contain exactly {} entries, numbered 1 to {}.\n",
        request.training_weeks, request.training_weeks, request.training_weeks
    ));
    prompt.push_str(&format!(
        "- Start date: {} ({}). Week 1 starts on this date; give every day its calendar date.\n",
        start.format("%Y-%m-%d"),
        weekday_of(start).localized(language)
    ));
    prompt.push_str(&format!(
        "- Training days per week: {}\n",
        request.training_days_per_week
    ));
    match request.planning_mode {
        PlanningMode::Auto => prompt.push_str(&format!(
            "- Training days: {NO_PREFERENCE}. Choose the {} best days yourself and keep them the same every week.\n",
            request.training_days_per_week
        )),
        PlanningMode::Manual => {
            let days: Vec<&str> = request
                .selected_days
                .iter()
                .map(|d| d.localized(language))
                .collect();
            let listed = if days.is_empty() {
                NO_PREFERENCE.to_string()
            } else {
                days.join(", ")
            };
            prompt.push_str(&format!(
                "- Training days: {listed}. Schedule sessions on these days only.\n"
            ));
        }
    }
    prompt.push('\n');

    // Method.
    push_method_section(&mut prompt, request.training_method.as_ref());

    // Intensity vocabulary.
    prompt.push_str("## Intensity\n\n");
    prompt.push_str(
        "The `intensity` field must be exactly one of these six values, \
         in ascending order of load. Never use any other word, and never translate them:\n\n",
    );
    for (intensity, guidance) in INTENSITY_GUIDANCE {
        prompt.push_str(&format!("- `{intensity}`: {guidance}\n"));
    }
    prompt.push_str(
        "\nMap your own wording onto these values: \"easy\" is `Light`, \"recovery\" is \
         `VeryLight`, \"tempo\" or \"threshold\" is `Heavy`, \"intervals\" is `VeryHeavy`, \
         \"race pace\" or \"all-out\" is `Peak`. `technicalData.rpe` is a whole number from 1 to 10 \
         that matches the intensity.\n\n",
    );

    // Consistency.
    prompt.push_str("## Consistency\n\n");
    prompt.push_str(CONSISTENCY_RULE);
    prompt.push_str("\n\n");

    prompt.push_str(SCHEDULE_SHAPE);
    prompt.push('\n');

    // Language.
    prompt.push_str("## Language\n\n");
    prompt.push_str(&format!(
        "Write every human-readable text value (titles, descriptions, focus, day names) in {}. \
         Keep the JSON keys and the intensity values in English exactly as shown.\n",
        language.name()
    ));

    prompt
}

fn push_method_section(prompt: &mut String, method: Option<&TrainingMethod>) {
    prompt.push_str("## Training Method\n\n");
    match method {
        Some(m) if m.is_known() => {
            prompt.push_str(&format!("Method: {}\n\n", m.label()));
        }
        Some(m) => {
            prompt.push_str(&format!("Method: {} (no specific rules)\n\n", m.identifier()));
        }
        None => prompt.push_str(&format!("Method: {NO_PREFERENCE}\n\n")),
    }
    prompt.push_str("Rules:\n");
    for (i, rule) in method::rules_for(method).iter().enumerate() {
        prompt.push_str(&format!("{}. {rule}\n", i + 1));
    }
    prompt.push('\n');
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => placeholder,
    }
}

fn weekday_of(date: chrono::NaiveDate) -> Weekday {
    match date.weekday() {
        chrono::Weekday::Mon => Weekday::Monday,
        chrono::Weekday::Tue => Weekday::Tuesday,
        chrono::Weekday::Wed => Weekday::Wednesday,
        chrono::Weekday::Thu => Weekday::Thursday,
        chrono::Weekday::Fri => Weekday::Friday,
        chrono::Weekday::Sat => Weekday::Saturday,
        chrono::Weekday::Sun => Weekday::Sunday,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::FALLBACK_RULE;
    use crate::request::{ExperienceLevel, Focus, Goal, Language, RecentPerformance};
    use chrono::NaiveDate;

    fn request() -> ScheduleRequest {
        ScheduleRequest {
            goal: Goal::TenK,
            focus: Focus::Performance,
            target_time: Some("50:00".into()),
            experience: ExperienceLevel::Intermediate,
            weekly_frequency: "3".into(),
            health_status: "healthy".into(),
            recent_performance: Some(RecentPerformance {
                distance: "5 km".into(),
                time: "24:10".into(),
            }),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            training_days_per_week: 4,
            training_weeks: 10,
            planning_mode: PlanningMode::Auto,
            selected_days: Vec::new(),
            language: Language::En,
            gender: None,
            age_bracket: None,
            training_method: Some(TrainingMethod::Gebalanceerd),
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let req = request();
        assert_eq!(build_prompt(&req), build_prompt(&req));
    }

    #[test]
    fn prompt_contains_weeks_and_method_rules() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Length: 10 weeks"));
        assert!(prompt.contains("exactly 10 entries"));
        assert!(prompt.contains("Balanced (Gebalanceerd)"));
        for rule in TrainingMethod::Gebalanceerd.rules() {
            assert!(prompt.contains(rule), "missing rule: {rule}");
        }
        assert!(!prompt.contains(FALLBACK_RULE));
        for rule in TrainingMethod::Polarized.rules() {
            assert!(!prompt.contains(rule), "foreign rule leaked: {rule}");
        }
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let mut req = request();
        req.target_time = None;
        req.weekly_frequency = String::new();
        req.health_status = "  ".into();
        req.recent_performance = None;
        req.training_method = None;
        let prompt = build_prompt(&req);

        assert!(prompt.contains("- Target time: no preference\n"));
        assert!(prompt.contains("- Current runs per week: Unknown\n"));
        assert!(prompt.contains("- Health and injuries: Unknown\n"));
        assert!(prompt.contains("- Recent performance: Unknown\n"));
        assert!(prompt.contains("- Gender: Unknown\n"));
        assert!(prompt.contains("- Age: Unknown\n"));
        assert!(prompt.contains("Method: no preference"));
        assert!(prompt.contains(FALLBACK_RULE));
    }

    #[test]
    fn prompt_shape_is_stable_across_optional_fields() {
        let full = build_prompt(&request());
        let mut sparse_req = request();
        sparse_req.target_time = None;
        sparse_req.recent_performance = None;
        sparse_req.age_bracket = None;
        let sparse = build_prompt(&sparse_req);
        assert_eq!(full.lines().count(), sparse.lines().count());
    }

    #[test]
    fn unrecognized_method_gets_fallback_only() {
        let mut req = request();
        req.training_method = Some(TrainingMethod::parse("Hansons"));
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Method: Hansons (no specific rules)"));
        assert!(prompt.contains(&format!("1. {FALLBACK_RULE}")));
        assert!(!prompt.contains("\n2. "));
    }

    #[test]
    fn embeds_intensity_vocabulary_and_consistency_rule() {
        let prompt = build_prompt(&request());
        for intensity in Intensity::ALL {
            assert!(prompt.contains(&format!("- `{intensity}`:")));
        }
        assert!(prompt.contains(CONSISTENCY_RULE));
        assert!(prompt.contains("\"technicalData\""));
        assert!(prompt.contains("\"weekSummary\""));
    }

    #[test]
    fn manual_days_are_localized() {
        let mut req = request();
        req.planning_mode = PlanningMode::Manual;
        req.selected_days = vec![Weekday::Tuesday, Weekday::Thursday, Weekday::Saturday];
        req.language = Language::Nl;
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Training days: dinsdag, donderdag, zaterdag."));
        assert!(prompt.contains("(maandag)"));
        assert!(prompt.contains("in Dutch"));
    }

    #[test]
    fn auto_mode_lets_model_choose() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Choose the 4 best days yourself"));
        assert!(prompt.contains("2026-11-02 (Monday)"));
        assert!(prompt.contains("in English"));
    }
}
