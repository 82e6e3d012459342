use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternId(pub u64);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a pattern's cue is tested against transaction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Cue appears anywhere in the case-folded description + reference.
    Contains,
    /// Case-folded description + reference starts with the cue.
    Prefix,
    /// Cue is a case-insensitive regular expression.
    Regex,
    /// Cue equals the transaction reference, ignoring case.
    ExactReference,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Contains => write!(f, "contains"),
            PatternKind::Prefix => write!(f, "prefix"),
            PatternKind::Regex => write!(f, "regex"),
            PatternKind::ExactReference => write!(f, "exact_reference"),
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(PatternKind::Contains),
            "prefix" | "starts_with" => Ok(PatternKind::Prefix),
            "regex" => Ok(PatternKind::Regex),
            "exact_reference" | "reference_exact" => Ok(PatternKind::ExactReference),
            other => Err(format!("Unknown pattern kind: '{other}'")),
        }
    }
}

/// A learned rule mapping a textual cue to a curated description/category.
///
/// Patterns are never deleted: once `confidence` falls to the activation floor
/// they stop matching but keep their counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub kind: PatternKind,
    pub cue: String,
    pub suggested_description: String,
    pub category_id: Option<CategoryId>,
    /// Always within [0.0, 1.0].
    pub confidence: f64,
    pub times_applied: u32,
    pub times_accepted: u32,
    pub updated_at: DateTime<Utc>,
    /// Store-wide sequence number of the last change; larger is more recent.
    pub revision: u64,
}

impl Pattern {
    /// Share of applications the user accepted, `None` before first use.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.times_applied == 0 {
            None
        } else {
            Some(f64::from(self.times_accepted) / f64::from(self.times_applied))
        }
    }
}

/// Clamp to [0.0, 1.0] and drop float noise so repeated ±0.1 steps land on
/// exact tenths.
pub fn normalize_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    ((value * 10_000.0).round() / 10_000.0).clamp(0.0, 1.0)
}

/// The best applicable pattern for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub pattern_id: PatternId,
    pub kind: PatternKind,
    pub matched_cue: String,
    pub suggested_description: String,
    pub category_id: Option<CategoryId>,
    pub confidence: f64,
}

impl From<&Pattern> for Suggestion {
    fn from(p: &Pattern) -> Self {
        Suggestion {
            pattern_id: p.id,
            kind: p.kind,
            matched_cue: p.cue.clone(),
            suggested_description: p.suggested_description.clone(),
            category_id: p.category_id,
            confidence: p.confidence,
        }
    }
}
