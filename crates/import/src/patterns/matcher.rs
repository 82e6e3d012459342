use ledgerline_core::{PatternKind, Suggestion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::store::{Entry, PatternStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Patterns at or below this confidence never match.
    pub activation_floor: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            activation_floor: 0.3,
        }
    }
}

/// Finds the best pattern for a transaction's description and reference.
#[derive(Debug, Clone)]
pub struct SuggestionMatcher {
    store: Arc<PatternStore>,
    config: MatcherConfig,
}

impl SuggestionMatcher {
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self::with_config(store, MatcherConfig::default())
    }

    pub fn with_config(store: Arc<PatternStore>, config: MatcherConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Highest-confidence live pattern that applies, the most recently
    /// updated one on a tie. `None` is the ordinary no-match result.
    pub fn suggest(&self, description: &str, reference: Option<&str>) -> Option<Suggestion> {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty());
        let haystack = search_text(description, reference);
        let inner = self.store.read();
        inner
            .entries
            .iter()
            .filter(|e| e.pattern.confidence > self.config.activation_floor)
            .filter(|e| matches(e, &haystack, reference))
            .max_by(|a, b| {
                a.pattern
                    .confidence
                    .total_cmp(&b.pattern.confidence)
                    .then(a.pattern.revision.cmp(&b.pattern.revision))
            })
            .map(|e| Suggestion::from(&e.pattern))
    }
}

/// Case-folded description and reference, joined by a space.
fn search_text(description: &str, reference: Option<&str>) -> String {
    let description = description.trim();
    match reference {
        Some(r) if !description.is_empty() => format!("{description} {r}").to_lowercase(),
        Some(r) => r.to_lowercase(),
        None => description.to_lowercase(),
    }
}

fn matches(entry: &Entry, haystack: &str, reference: Option<&str>) -> bool {
    let cue = &entry.pattern.cue;
    match entry.pattern.kind {
        PatternKind::Contains => haystack.contains(&cue.to_lowercase()),
        PatternKind::Prefix => haystack.starts_with(&cue.to_lowercase()),
        PatternKind::Regex => entry.regex.as_ref().is_some_and(|re| re.is_match(haystack)),
        PatternKind::ExactReference => reference.is_some_and(|r| r.eq_ignore_ascii_case(cue)),
    }
}
