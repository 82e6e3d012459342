pub mod amounts;
pub mod assembler;
pub mod dates;
pub mod layout;
pub mod patterns;
pub mod report;
pub(crate) mod util;

pub use amounts::{find_amounts, parse_amount, AmountToken};
pub use assembler::{assemble, Assembler, AssemblerConfig};
pub use dates::{detect_statement_date, find_dates, DateToken};
pub use layout::{AmountFields, ColumnLayout};
pub use patterns::{
    LearnOutcome, LearnerConfig, MatcherConfig, NewPattern, PatternError, PatternLearner,
    PatternStore, SuggestionMatcher,
};
pub use report::{Assembly, AssemblyReport, BalanceMismatch, LineSkipped, SkipReason};
