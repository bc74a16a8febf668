use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Ordered severity levels attached to every finding.
///
/// The discriminants are the additive scoring weight and the process exit
/// code for the level. Absence of a level (no findings, or a producer value
/// that is not one of the canonical strings) is modelled as `None` and maps
/// to 0 in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Contribution of a single finding at this level to the summary score.
    pub fn weight(self) -> u32 {
        self as u32
    }

    /// Process exit code used when this is the highest level observed.
    pub fn exit_code(self) -> i32 {
        self as i32
    }

    /// Canonical upper-case spelling used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Whether `raw` is exactly one of the canonical spellings. No case folding.
    pub fn is_valid(raw: &str) -> bool {
        raw.parse::<Severity>().is_ok()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string is not one of `LOW`, `MEDIUM`, `HIGH`, `CRITICAL`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized severity `{raw}` (expected LOW, MEDIUM, HIGH or CRITICAL)")]
pub struct SeverityParseError {
    pub raw: String,
}

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(SeverityParseError {
                raw: other.to_string(),
            }),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Weight of an optional level; unset or unrecognized levels weigh 0.
pub fn weight_of(level: Option<Severity>) -> u32 {
    level.map_or(0, Severity::weight)
}

/// Exit code of an optional level; unset or unrecognized levels map to 0.
pub fn exit_code_of(level: Option<Severity>) -> i32 {
    level.map_or(0, Severity::exit_code)
}

/// Highest level in `levels`, or `None` when no recognized level is present.
pub fn highest<I>(levels: I) -> Option<Severity>
where
    I: IntoIterator<Item = Option<Severity>>,
{
    levels.into_iter().flatten().max()
}

/// Lenient (de)serialization for finding severities.
///
/// Producers outside this crate emit severities as strings. Anything other
/// than a canonical spelling becomes `None` instead of failing the whole
/// document, and `None` is written back as an empty string.
pub(crate) mod lenient {
    use super::Severity;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        level: &Option<Severity>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(level.map_or("", Severity::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Severity>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| value.parse().ok()))
    }
}
