use ledgerline_core::{CategoryId, Pattern, PatternId, PatternKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::store::{Feedback, NewPattern, PatternStore};
use super::PatternError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Generic banking words that never become keyword cues. Compared
    /// case-insensitively.
    pub stoplist: Vec<String>,
    pub min_reference_len: usize,
    pub min_keyword_len: usize,
    pub initial_confidence: f64,
    /// Confidence added per reinforcement and removed per rejection.
    pub step: f64,
    /// Confidence added when a suggestion is accepted as offered.
    pub accept_step: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            stoplist: [
                "PURCHASE", "LOCAL", "DEBIT", "CREDIT", "PAYMENT", "TRANSFER", "DEPOSIT",
                "WITHDRAWAL", "CHARGE", "CHEQUE", "ORDER",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_reference_len: 6,
            min_keyword_len: 5,
            initial_confidence: 0.7,
            step: 0.1,
            accept_step: 0.05,
        }
    }
}

impl LearnerConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, PatternError> {
        let config: Self = toml::from_str(toml_content)
            .map_err(|e| PatternError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        if !(0.0..=1.0).contains(&self.initial_confidence) {
            return Err(PatternError::Config(format!(
                "initial_confidence {} is outside [0, 1]",
                self.initial_confidence
            )));
        }
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(PatternError::Config(format!("step {} is outside (0, 1]", self.step)));
        }
        if !(self.accept_step > 0.0 && self.accept_step <= 1.0) {
            return Err(PatternError::Config(format!(
                "accept_step {} is outside (0, 1]",
                self.accept_step
            )));
        }
        Ok(())
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stoplist.iter().any(|s| s.eq_ignore_ascii_case(token))
    }
}

/// What one proposed cue did to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "pattern", rename_all = "snake_case")]
pub enum LearnOutcome {
    Created(Pattern),
    Reinforced(Pattern),
}

impl LearnOutcome {
    pub fn pattern(&self) -> &Pattern {
        match self {
            LearnOutcome::Created(p) | LearnOutcome::Reinforced(p) => p,
        }
    }
}

/// Derives patterns from user corrections and applies explicit feedback.
#[derive(Debug, Clone)]
pub struct PatternLearner {
    store: Arc<PatternStore>,
    config: LearnerConfig,
}

impl PatternLearner {
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self {
            store,
            config: LearnerConfig::default(),
        }
    }

    pub fn with_config(store: Arc<PatternStore>, config: LearnerConfig) -> Result<Self, PatternError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Record that `original_description` should read `corrected_description`.
    ///
    /// Proposes an exact-reference cue and a keyword cue; each reinforces an
    /// existing pattern with the same kind and cue or creates a new one. A
    /// blank correction teaches nothing.
    pub fn learn(
        &self,
        original_description: &str,
        corrected_description: &str,
        reference: Option<&str>,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<LearnOutcome>, PatternError> {
        let corrected = corrected_description.trim();
        if corrected.is_empty() {
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::new();
        for (kind, cue) in self.proposals(original_description, reference) {
            let new = NewPattern {
                kind,
                cue,
                suggested_description: corrected.to_string(),
                category_id,
            };
            let (pattern, created) =
                self.store
                    .reinforce_or_create(new, self.config.initial_confidence, self.config.step)?;
            outcomes.push(if created {
                LearnOutcome::Created(pattern)
            } else {
                LearnOutcome::Reinforced(pattern)
            });
        }
        Ok(outcomes)
    }

    /// The user took a suggestion as offered.
    pub fn accept(&self, id: PatternId) -> Result<Pattern, PatternError> {
        self.store.feedback(id, Feedback::Accepted, self.config.accept_step)
    }

    /// The user turned a suggestion down.
    pub fn reject(&self, id: PatternId) -> Result<Pattern, PatternError> {
        self.store.feedback(id, Feedback::Rejected, self.config.step)
    }

    fn proposals(&self, original: &str, reference: Option<&str>) -> Vec<(PatternKind, String)> {
        let mut out = Vec::with_capacity(2);
        if let Some(r) = reference.map(str::trim) {
            if r.chars().count() >= self.config.min_reference_len {
                out.push((PatternKind::ExactReference, r.to_string()));
            }
        }
        if let Some(keyword) = self.keyword(original) {
            out.push((PatternKind::Contains, keyword));
        }
        out
    }

    /// First distinctive word of the original description, uppercased.
    fn keyword(&self, original: &str) -> Option<String> {
        original
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| matches!(c, '*' | '.' | ',')))
            .find(|t| {
                t.chars().count() >= self.config.min_keyword_len
                    && t.chars().any(char::is_alphabetic)
                    && !self.config.is_stopword(t)
            })
            .map(str::to_uppercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::SuggestionMatcher;

    fn setup() -> (Arc<PatternStore>, PatternLearner, SuggestionMatcher) {
        let store = Arc::new(PatternStore::new());
        let learner = PatternLearner::new(Arc::clone(&store));
        let matcher = SuggestionMatcher::new(Arc::clone(&store));
        (store, learner, matcher)
    }

    #[test]
    fn learned_keyword_suggests_for_similar_transaction() {
        let (_, learner, matcher) = setup();
        let outcomes = learner
            .learn(
                "Outward EFT MTN To 4063304150 632005",
                "Mobile - MTN Monthly",
                None,
                Some(CategoryId(3)),
            )
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(&outcomes[0], LearnOutcome::Created(p) if p.cue == "OUTWARD"));

        let s = matcher
            .suggest("Outward EFT MTN To 4063304150 632006", None)
            .unwrap();
        assert_eq!(s.suggested_description, "Mobile - MTN Monthly");
        assert_eq!(s.confidence, 0.7);
        assert_eq!(s.category_id, Some(CategoryId(3)));
    }

    #[test]
    fn reference_and_keyword_are_both_proposed() {
        let (store, learner, _) = setup();
        let outcomes = learner
            .learn("** MTN Airtime 2023", "Airtime", Some("A0159924"), None)
            .unwrap();
        let kinds: Vec<_> = outcomes.iter().map(|o| (o.pattern().kind, o.pattern().cue.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                (PatternKind::ExactReference, "A0159924".to_string()),
                (PatternKind::Contains, "AIRTIME".to_string()),
            ]
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn short_reference_and_stopwords_are_ignored() {
        let (store, learner, _) = setup();
        let outcomes = learner
            .learn("POS PURCHASE LOCAL Checkers", "Groceries", Some("12345"), None)
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].pattern().cue, "CHECKERS");
        assert_eq!(outcomes[0].pattern().kind, PatternKind::Contains);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn keyword_needs_a_letter() {
        let (_, learner, _) = setup();
        let outcomes = learner.learn("4063304150 632005", "Rent", None, None).unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn reinforcement_ramps_to_one_and_stops() {
        for n in 0..6u32 {
            let (store, learner, _) = setup();
            for _ in 0..=n {
                learner.learn("Netflix 2231", "Streaming", None, None).unwrap();
            }
            let p = store.find(PatternKind::Contains, "NETFLIX").unwrap();
            let expected = 0.7 + (f64::from(n) * 0.1).min(0.3);
            assert!((p.confidence - expected).abs() < 1e-9, "n={n}: {}", p.confidence);
            assert!(p.confidence <= 1.0);
            assert_eq!(p.times_applied, n + 1);
            assert_eq!(p.times_accepted, n + 1);
        }
    }

    #[test]
    fn blank_correction_is_a_no_op() {
        let (store, learner, _) = setup();
        assert!(learner.learn("Netflix", "   ", Some("REF123456"), None).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn accept_moves_half_as_far_as_reject() {
        let (_, learner, matcher) = setup();
        let id = learner.learn("Woolworths Food", "Groceries", None, None).unwrap()[0]
            .pattern()
            .id;
        let rejected = learner.reject(id).unwrap();
        assert_eq!(rejected.confidence, 0.6);
        assert_eq!((rejected.times_applied, rejected.times_accepted), (2, 1));
        let accepted = learner.accept(id).unwrap();
        assert_eq!(accepted.confidence, 0.65);
        assert_eq!((accepted.times_applied, accepted.times_accepted), (3, 2));

        for _ in 0..4 {
            learner.reject(id).unwrap();
        }
        assert!(matcher.suggest("WOOLWORTHS FOOD", None).is_none());
        assert!(learner.reject(PatternId(99)).is_err());
    }

    #[test]
    fn config_from_toml_overrides_stoplist() {
        let config = LearnerConfig::from_toml("stoplist = [\"OUTWARD\"]\nstep = 0.2").unwrap();
        assert_eq!(config.min_keyword_len, 5);
        let store = Arc::new(PatternStore::new());
        let learner = PatternLearner::with_config(Arc::clone(&store), config).unwrap();
        let outcomes = learner
            .learn("Outward EFT MTN To 4063304150 632005", "Mobile", None, None)
            .unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        assert!(matches!(
            LearnerConfig::from_toml("initial_confidence = 1.5"),
            Err(PatternError::Config(_))
        ));
        assert!(LearnerConfig::from_toml("step = 0.0").is_err());
        assert!(LearnerConfig::from_toml("accept_step = -0.05").is_err());
        assert_eq!(LearnerConfig::from_toml("accept_step = 0.1").unwrap().accept_step, 0.1);
        assert!(LearnerConfig::from_toml("stoplist = 3").is_err());
    }
}
