pub mod money;
pub mod pattern;
pub mod transaction;

pub use money::Money;
pub use pattern::{normalize_confidence, CategoryId, Pattern, PatternId, PatternKind, Suggestion};
pub use transaction::TransactionRecord;
