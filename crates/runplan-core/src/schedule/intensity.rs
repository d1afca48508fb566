//! Canonical session intensity and the keyword classifier that maps free-form
//! model output onto it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Session effort, ordered by ascending load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Intensity {
    VeryLight,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
    Peak,
}

/// Phrases per bucket, checked in this order. A bucket whose phrases are a
/// superset of another's ("very light" vs "light") must come first.
const CLASSIFICATION_ORDER: &[(Intensity, &[&str])] = &[
    (
        Intensity::VeryLight,
        &[
            "very light",
            "very easy",
            "extremely easy",
            "recovery",
            "recover",
            "regeneration",
            "zeer licht",
            "zeer laag",
            "heel rustig",
            "zeer rustig",
            "herstel",
            "hersteltraining",
            "herstelloop",
            "zone 1",
            "z1",
        ],
    ),
    (
        Intensity::Light,
        &[
            "light",
            "easy",
            "low",
            "gentle",
            "comfortable",
            "conversational",
            "long slow",
            "licht",
            "laag",
            "rustig",
            "makkelijk",
            "duurloop",
            "zone 2",
            "z2",
        ],
    ),
    (
        Intensity::Moderate,
        &[
            "moderate",
            "medium",
            "steady",
            "average",
            "marathon pace",
            "gemiddeld",
            "matig",
            "middel",
            "normaal",
            "zone 3",
            "z3",
        ],
    ),
    (
        Intensity::VeryHeavy,
        &[
            "very heavy",
            "very hard",
            "very high",
            "vo2",
            "vo2max",
            "anaerobic",
            "zeer zwaar",
            "zeer hoog",
            "zeer intensief",
            "zone 5",
            "z5",
        ],
    ),
    (
        Intensity::Heavy,
        &[
            "heavy",
            "hard",
            "high",
            "intense",
            "threshold",
            "tempo",
            "lactate",
            "zwaar",
            "hoog",
            "intensief",
            "drempel",
            "zone 4",
            "z4",
        ],
    ),
    (
        Intensity::Peak,
        &[
            "peak",
            "race pace",
            "race",
            "all out",
            "max",
            "maximal",
            "maximum",
            "sprint",
            "piek",
            "maximaal",
            "wedstrijd",
            "wedstrijdtempo",
            "volle kracht",
        ],
    ),
];

impl Intensity {
    /// All six values in ascending order.
    pub const ALL: [Intensity; 6] = [
        Self::VeryLight,
        Self::Light,
        Self::Moderate,
        Self::Heavy,
        Self::VeryHeavy,
        Self::Peak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLight => "VeryLight",
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
            Self::VeryHeavy => "VeryHeavy",
            Self::Peak => "Peak",
        }
    }

    /// Classify any string into one of the six buckets. Never fails.
    ///
    /// Canonical names match first, ignoring case and separators
    /// (`"very_light"`, `"Very Light"`). Otherwise the text is split into
    /// lowercase words and checked phrase by phrase in bucket order. Anything
    /// unrecognized is `Moderate`.
    pub fn normalize(raw: &str) -> Self {
        let compact: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if let Some(exact) = Self::ALL
            .iter()
            .find(|i| i.as_str().to_ascii_lowercase() == compact)
        {
            return *exact;
        }

        let words: Vec<String> = raw
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return Self::Moderate;
        }
        // Space-padded so phrase lookups only hit whole words.
        let haystack = format!(" {} ", words.join(" "));

        for (bucket, phrases) in CLASSIFICATION_ORDER {
            if phrases
                .iter()
                .any(|p| haystack.contains(&format!(" {p} ")))
            {
                return *bucket;
            }
        }
        Self::Moderate
    }

    /// Typical RPE for the bucket, used when the model leaves it out.
    pub fn default_rpe(&self) -> u8 {
        match self {
            Self::VeryLight => 2,
            Self::Light => 3,
            Self::Moderate => 5,
            Self::Heavy => 7,
            Self::VeryHeavy => 8,
            Self::Peak => 10,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a non-canonical [`Intensity`] string.
#[derive(Debug, Clone)]
pub struct IntensityParseError(pub String);

impl fmt::Display for IntensityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid intensity: {:?}", self.0)
    }
}

impl std::error::Error for IntensityParseError {}

impl FromStr for Intensity {
    type Err = IntensityParseError;

    /// Strict parse of the canonical names only. Use [`Intensity::normalize`]
    /// for model output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| IntensityParseError(s.to_owned()))
    }
}
