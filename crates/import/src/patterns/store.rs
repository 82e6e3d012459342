use chrono::Utc;
use ledgerline_core::{normalize_confidence, CategoryId, Pattern, PatternId, PatternKind};
use regex::{Regex, RegexBuilder};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::PatternError;

/// A pattern plus its compiled regex when `kind` is `Regex`.
pub(crate) struct Entry {
    pub(crate) pattern: Pattern,
    pub(crate) regex: Option<Regex>,
}

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) entries: Vec<Entry>,
    next_id: u64,
    revision: u64,
}

impl Inner {
    fn find(&self, kind: PatternKind, cue: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.pattern.kind == kind && same_cue(kind, &e.pattern.cue, cue))
    }

    fn find_id(&self, id: PatternId) -> Option<usize> {
        self.entries.iter().position(|e| e.pattern.id == id)
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn push(&mut self, new: NewPattern, regex: Option<Regex>, confidence: f64) -> &Pattern {
        self.next_id += 1;
        let revision = self.bump();
        let pattern = Pattern {
            id: PatternId(self.next_id),
            kind: new.kind,
            cue: new.cue,
            suggested_description: new.suggested_description,
            category_id: new.category_id,
            confidence: normalize_confidence(confidence),
            times_applied: 1,
            times_accepted: 1,
            updated_at: Utc::now(),
            revision,
        };
        self.entries.push(Entry { pattern, regex });
        let last = self.entries.len() - 1;
        &self.entries[last].pattern
    }
}

/// Input for a pattern that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPattern {
    pub kind: PatternKind,
    pub cue: String,
    pub suggested_description: String,
    pub category_id: Option<CategoryId>,
}

/// Which way a piece of feedback moves a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feedback {
    Accepted,
    Rejected,
}

/// Shared, mutable set of patterns.
///
/// Reads run concurrently; every confidence/counter update happens under the
/// write lock so concurrent corrections never lose an update. Wrap in an `Arc`
/// to share between a matcher, a learner and worker tasks.
#[derive(Default)]
pub struct PatternStore {
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for PatternStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternStore").field("len", &self.len()).finish()
    }
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot. Ids and revisions are kept, so
    /// recency tie-breaks survive a save/load cycle.
    pub fn from_patterns(patterns: Vec<Pattern>) -> Result<Self, PatternError> {
        let mut inner = Inner::default();
        for mut pattern in patterns {
            let regex = compile_cue(pattern.kind, &pattern.cue)?;
            pattern.confidence = normalize_confidence(pattern.confidence);
            inner.next_id = inner.next_id.max(pattern.id.0);
            inner.revision = inner.revision.max(pattern.revision);
            inner.entries.push(Entry { pattern, regex });
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// All patterns, in creation order.
    pub fn snapshot(&self) -> Vec<Pattern> {
        self.read().entries.iter().map(|e| e.pattern.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: PatternId) -> Option<Pattern> {
        let inner = self.read();
        inner.find_id(id).map(|i| inner.entries[i].pattern.clone())
    }

    pub fn find(&self, kind: PatternKind, cue: &str) -> Option<Pattern> {
        let inner = self.read();
        inner.find(kind, cue).map(|i| inner.entries[i].pattern.clone())
    }

    /// Add an operator-defined pattern of any kind at `confidence`.
    pub fn insert(&self, new: NewPattern, confidence: f64) -> Result<PatternId, PatternError> {
        let new = NewPattern {
            cue: new.cue.trim().to_string(),
            ..new
        };
        if new.cue.is_empty() {
            return Err(PatternError::EmptyCue);
        }
        let regex = compile_cue(new.kind, &new.cue)?;
        let mut inner = self.write();
        if let Some(i) = inner.find(new.kind, &new.cue) {
            return Err(PatternError::Duplicate(inner.entries[i].pattern.id));
        }
        Ok(inner.push(new, regex, confidence).id)
    }

    /// Reinforce the pattern holding `new.kind` + `new.cue`, or create it.
    /// Returns the updated pattern and whether it was created.
    pub(crate) fn reinforce_or_create(
        &self,
        new: NewPattern,
        initial_confidence: f64,
        step: f64,
    ) -> Result<(Pattern, bool), PatternError> {
        if new.cue.is_empty() {
            return Err(PatternError::EmptyCue);
        }
        let mut inner = self.write();
        match inner.find(new.kind, &new.cue) {
            Some(i) => {
                let revision = inner.bump();
                let p = &mut inner.entries[i].pattern;
                p.suggested_description = new.suggested_description;
                p.category_id = new.category_id;
                apply(p, Feedback::Accepted, step, revision);
                debug!(id = %p.id, kind = %p.kind, cue = %p.cue, confidence = p.confidence, "pattern reinforced");
                Ok((p.clone(), false))
            }
            None => {
                let regex = compile_cue(new.kind, &new.cue)?;
                let p = inner.push(new, regex, initial_confidence);
                debug!(id = %p.id, kind = %p.kind, cue = %p.cue, confidence = p.confidence, "pattern created");
                Ok((p.clone(), true))
            }
        }
    }

    /// Apply accept/reject feedback to an existing pattern.
    pub(crate) fn feedback(
        &self,
        id: PatternId,
        feedback: Feedback,
        step: f64,
    ) -> Result<Pattern, PatternError> {
        let mut inner = self.write();
        let i = inner.find_id(id).ok_or(PatternError::NotFound(id))?;
        let revision = inner.bump();
        let p = &mut inner.entries[i].pattern;
        apply(p, feedback, step, revision);
        debug!(id = %p.id, ?feedback, confidence = p.confidence, "pattern feedback applied");
        Ok(p.clone())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply(p: &mut Pattern, feedback: Feedback, step: f64, revision: u64) {
    p.times_applied = p.times_applied.saturating_add(1);
    let delta = match feedback {
        Feedback::Accepted => {
            p.times_accepted = p.times_accepted.saturating_add(1);
            step
        }
        Feedback::Rejected => -step,
    };
    p.confidence = normalize_confidence(p.confidence + delta);
    p.updated_at = Utc::now();
    p.revision = revision;
}

/// Regex cues compare exactly: `\d` and `\D` differ only by case.
fn same_cue(kind: PatternKind, a: &str, b: &str) -> bool {
    match kind {
        PatternKind::Regex => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}

fn compile_cue(kind: PatternKind, cue: &str) -> Result<Option<Regex>, PatternError> {
    if kind != PatternKind::Regex {
        return Ok(None);
    }
    RegexBuilder::new(cue)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| PatternError::InvalidRegex {
            cue: cue.to_string(),
            source,
        })
}
