//! Learned description/category patterns: the shared store, the matcher that
//! reads it and the learner that feeds it from user corrections.

pub mod learner;
pub mod matcher;
pub mod store;

pub use learner::{LearnOutcome, LearnerConfig, PatternLearner};
pub use matcher::{MatcherConfig, SuggestionMatcher};
pub use store::{NewPattern, PatternStore};

use ledgerline_core::PatternId;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid regex cue '{cue}': {source}")]
    InvalidRegex {
        cue: String,
        #[source]
        source: regex::Error,
    },
    #[error("Pattern cue must not be empty")]
    EmptyCue,
    #[error("Pattern {0} not found")]
    NotFound(PatternId),
    #[error("Pattern {0} already holds this cue")]
    Duplicate(PatternId),
    #[error("Invalid pattern configuration: {0}")]
    Config(String),
}
