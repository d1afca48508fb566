//! Training methods and the rule lists that steer the model for each one.
//!
//! A method is a closed set of coaching methodologies. Each variant owns an
//! ordered list of short constraints that are pasted into the prompt. Only one
//! method's rules ever appear in a single prompt; an unknown or absent method
//! gets [`FALLBACK_RULE`] instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule used when the request names no method or one we do not know.
pub const FALLBACK_RULE: &str =
    "Use only the rules of the chosen training method; do not combine elements of different methods.";

const GEBALANCEERD_RULES: &[&str] = &[
    "Spread the weekly load evenly: roughly 70% easy running, 20% moderate, 10% hard.",
    "Never schedule two quality sessions (tempo, interval, threshold) on consecutive days.",
    "Include exactly one long run per week, on the last training day of the week when possible.",
    "Increase total weekly volume by at most 10% compared to the previous week.",
    "Every fourth week is a recovery week with about 25% less volume.",
    "Taper the final one to two weeks before the goal: keep intensity, cut volume by 30-50%.",
];

const POLARIZED_RULES: &[&str] = &[
    "About 80% of all sessions are very light or light (zone 1-2); about 20% are heavy or harder.",
    "Avoid moderate (zone 3) sessions almost entirely; easy days stay truly easy.",
    "Hard sessions are short intervals or hill repeats at VeryHeavy or Peak effort.",
    "Never combine two hard sessions on consecutive days.",
    "The long run is always run at Light intensity.",
    "Taper the final week by reducing volume while keeping one short hard session.",
];

const NORWEGIAN_RULES: &[&str] = &[
    "Quality work is threshold running: intervals at controlled Heavy effort, never all-out.",
    "Plan two threshold sessions per week for intermediate and advanced runners, one for beginners.",
    "Threshold intervals are 4-10 minutes or 1-3 km repetitions with short recoveries (60-90 seconds).",
    "All remaining sessions are VeryLight or Light easy running.",
    "Do not schedule VeryHeavy or Peak sessions except one race-specific session in the last three weeks.",
    "Never place threshold sessions on consecutive days unless they are a morning/evening double on the same day.",
];

const MAF_RULES: &[&str] = &[
    "Almost every session stays below the aerobic heart rate ceiling (180 minus age): VeryLight or Light.",
    "No intervals or tempo work during the first two thirds of the plan.",
    "Progress by adding duration, never by adding intensity.",
    "Add short strides (4-6 x 20 seconds) at most twice a week once the base phase is complete.",
    "The final third may include one Moderate session per week; never Heavy or harder.",
];

const LYDIARD_RULES: &[&str] = &[
    "Follow the phases in order: aerobic base, hill strength, anaerobic development, sharpening, taper.",
    "The base phase makes up about half of the plan and contains only Light and Moderate running.",
    "Hill phase sessions are hill circuits or bounding at Heavy effort, at most three per week.",
    "Anaerobic sessions appear only after the hill phase and never on consecutive days.",
    "Keep one long Light run every week in every phase.",
    "Sharpening and taper weeks reduce volume and include short race-pace efforts.",
];

/// A coaching methodology that constrains how sessions are structured.
///
/// Parsing is exact-match on the identifiers returned by [`Self::identifier`];
/// anything else is preserved in [`Self::Unrecognized`] so it can still be
/// echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainingMethod {
    /// Balanced mix of easy, moderate and hard work.
    Gebalanceerd,
    /// 80/20 polarized training.
    Polarized,
    /// Threshold-zone based, controlled lactate work.
    Norwegian,
    /// Low heart rate aerobic training (Maffetone).
    Maf,
    /// Aerobic base periodization.
    Lydiard,
    /// An identifier we have no rule list for.
    Unrecognized(String),
}

impl TrainingMethod {
    /// All methods with a rule list, in display order.
    pub fn known() -> [TrainingMethod; 5] {
        [
            Self::Gebalanceerd,
            Self::Polarized,
            Self::Norwegian,
            Self::Maf,
            Self::Lydiard,
        ]
    }

    /// Exact-match lookup on the method identifier.
    pub fn parse(identifier: &str) -> Self {
        match identifier {
            "Gebalanceerd" => Self::Gebalanceerd,
            "Polarized" => Self::Polarized,
            "Norwegian" => Self::Norwegian,
            "MAF" => Self::Maf,
            "Lydiard" => Self::Lydiard,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    /// The identifier the method is parsed from and serialized to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Gebalanceerd => "Gebalanceerd",
            Self::Polarized => "Polarized",
            Self::Norwegian => "Norwegian",
            Self::Maf => "MAF",
            Self::Lydiard => "Lydiard",
            Self::Unrecognized(id) => id,
        }
    }

    /// Human-readable label used in the prompt.
    pub fn label(&self) -> &str {
        match self {
            Self::Gebalanceerd => "Balanced (Gebalanceerd)",
            Self::Polarized => "Polarized 80/20",
            Self::Norwegian => "Norwegian threshold method",
            Self::Maf => "MAF low heart rate training",
            Self::Lydiard => "Lydiard periodization",
            Self::Unrecognized(id) => id,
        }
    }

    /// Ordered constraints for this method.
    pub fn rules(&self) -> &'static [&'static str] {
        match self {
            Self::Gebalanceerd => GEBALANCEERD_RULES,
            Self::Polarized => POLARIZED_RULES,
            Self::Norwegian => NORWEGIAN_RULES,
            Self::Maf => MAF_RULES,
            Self::Lydiard => LYDIARD_RULES,
            Self::Unrecognized(_) => &[FALLBACK_RULE],
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

/// Rules for an optional method: the method's own list, or the fallback.
pub fn rules_for(method: Option<&TrainingMethod>) -> &'static [&'static str] {
    match method {
        Some(m) => m.rules(),
        None => &[FALLBACK_RULE],
    }
}

impl From<String> for TrainingMethod {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<TrainingMethod> for String {
    fn from(m: TrainingMethod) -> Self {
        m.identifier().to_owned()
    }
}

impl fmt::Display for TrainingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact_match() {
        assert_eq!(TrainingMethod::parse("Gebalanceerd"), TrainingMethod::Gebalanceerd);
        assert_eq!(TrainingMethod::parse("MAF"), TrainingMethod::Maf);
        assert_eq!(
            TrainingMethod::parse("gebalanceerd"),
            TrainingMethod::Unrecognized("gebalanceerd".to_string())
        );
        assert_eq!(
            TrainingMethod::parse("Polarized "),
            TrainingMethod::Unrecognized("Polarized ".to_string())
        );
    }

    #[test]
    fn identifiers_roundtrip() {
        for method in TrainingMethod::known() {
            assert_eq!(TrainingMethod::parse(method.identifier()), method);
            assert!(method.is_known());
        }
    }

    #[test]
    fn every_known_method_has_rules() {
        for method in TrainingMethod::known() {
            assert!(
                method.rules().len() >= 3,
                "{method} should have a real rule list"
            );
            assert!(!method.rules().contains(&FALLBACK_RULE));
        }
    }

    #[test]
    fn unrecognized_gets_single_fallback_rule() {
        let method = TrainingMethod::parse("Hansons");
        assert!(!method.is_known());
        assert_eq!(method.rules(), &[FALLBACK_RULE]);
        assert_eq!(rules_for(None), &[FALLBACK_RULE]);
    }

    #[test]
    fn serde_uses_identifier() {
        let json = serde_json::to_string(&TrainingMethod::Maf).unwrap();
        assert_eq!(json, "\"MAF\"");
        let parsed: TrainingMethod = serde_json::from_str("\"Lydiard\"").unwrap();
        assert_eq!(parsed, TrainingMethod::Lydiard);
        let unknown: TrainingMethod = serde_json::from_str("\"Galloway\"").unwrap();
        assert_eq!(unknown, TrainingMethod::Unrecognized("Galloway".to_string()));
    }
}
