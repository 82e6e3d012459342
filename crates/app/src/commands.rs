//! Command implementations for the CLI.

use anyhow::{Context, Result};
use ledgerline::{store_file, Settings, StatementPipeline};
use ledgerline_core::{CategoryId, PatternId};
use ledgerline_import::{PatternLearner, PatternStore, SuggestionMatcher};
use ledgerline_ocr::{InMemoryDocument, TextRecognizer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => Settings::load(p).with_context(|| format!("loading settings from {}", p.display())),
        None => Ok(Settings::default()),
    }
}

/// `--store` wins over the settings file, which wins over the platform data dir.
pub fn resolve_store_path(flag: Option<&Path>, settings: &Settings) -> Result<PathBuf> {
    if let Some(p) = flag.or(settings.store_path.as_deref()) {
        return Ok(p.to_path_buf());
    }
    let dirs = directories::ProjectDirs::from("org", "ledgerline", "Ledgerline")
        .context("no home directory to place the pattern store in; pass --store")?;
    Ok(dirs.data_dir().join("patterns.json"))
}

fn open_store(path: &Path) -> Result<Arc<PatternStore>> {
    let store = store_file::load(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Arc::new(store))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(feature = "tesseract")]
fn recognizer(settings: &Settings) -> Arc<dyn TextRecognizer> {
    Arc::new(ledgerline_ocr::TesseractRecognizer::new(settings.tessdata_path.clone()))
}

#[cfg(not(feature = "tesseract"))]
fn recognizer(_settings: &Settings) -> Arc<dyn TextRecognizer> {
    Arc::new(ledgerline_ocr::UnavailableRecognizer)
}

pub struct ParseArgs {
    pub text_file: Option<PathBuf>,
    pub pages: Vec<PathBuf>,
    pub force_ocr: bool,
    pub no_auto_detect: bool,
    pub suggest: bool,
}

pub async fn cmd_parse(mut settings: Settings, store_path: &Path, args: ParseArgs) -> Result<()> {
    let name = args
        .text_file
        .as_ref()
        .or(args.pages.first())
        .map(|p| p.display().to_string())
        .context("nothing to parse: give a text file or at least one --page")?;

    let mut document = InMemoryDocument::new(name);
    if let Some(path) = &args.text_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        document = document.with_text(text);
    }
    for page in &args.pages {
        let bytes = tokio::fs::read(page)
            .await
            .with_context(|| format!("reading page image {}", page.display()))?;
        document = document.with_page_image(bytes);
    }

    if args.no_auto_detect {
        settings.selector.auto_detect = false;
    }
    let mut pipeline = StatementPipeline::from_settings(recognizer(&settings), &settings);
    if args.suggest {
        let matcher = SuggestionMatcher::with_config(open_store(store_path)?, settings.matcher.clone());
        pipeline = pipeline.with_matcher(matcher);
    }

    let processed = pipeline.process(document, args.force_ocr).await?;
    if !processed.report.balance_mismatches.is_empty() {
        tracing::warn!(
            mismatches = processed.report.balance_mismatches.len(),
            layout = %settings.assembler.layout,
            "balances do not follow from amounts; check the column layout"
        );
    }
    print_json(&processed)
}

pub fn cmd_suggest(settings: &Settings, store_path: &Path, description: &str, reference: Option<&str>) -> Result<()> {
    let matcher = SuggestionMatcher::with_config(open_store(store_path)?, settings.matcher.clone());
    print_json(&matcher.suggest(description, reference))
}

pub fn cmd_learn(
    settings: &Settings,
    store_path: &Path,
    original: &str,
    corrected: &str,
    reference: Option<&str>,
    category: Option<i64>,
) -> Result<()> {
    let store = open_store(store_path)?;
    let learner = PatternLearner::with_config(Arc::clone(&store), settings.learner.clone())?;
    let outcomes = learner.learn(original, corrected, reference, category.map(CategoryId))?;
    store_file::save(store_path, &store)?;
    print_json(&outcomes)
}

pub fn cmd_feedback(settings: &Settings, store_path: &Path, pattern_id: u64, accepted: bool) -> Result<()> {
    let store = open_store(store_path)?;
    let learner = PatternLearner::with_config(Arc::clone(&store), settings.learner.clone())?;
    let id = PatternId(pattern_id);
    let pattern = if accepted {
        learner.accept(id)?
    } else {
        learner.reject(id)?
    };
    store_file::save(store_path, &store)?;
    print_json(&pattern)
}

pub fn cmd_patterns(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    print_json(&store.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_flag_overrides_settings() {
        let settings = Settings {
            store_path: Some(PathBuf::from("/from/settings.json")),
            ..Default::default()
        };
        let flag = PathBuf::from("/from/flag.json");
        assert_eq!(resolve_store_path(Some(flag.as_path()), &settings).unwrap(), flag);
        assert_eq!(
            resolve_store_path(None, &settings).unwrap(),
            PathBuf::from("/from/settings.json")
        );
    }

    #[test]
    fn learn_then_reject_persists_to_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        let settings = Settings::default();

        cmd_learn(&settings, &path, "Woolworths Food", "Groceries", None, Some(2)).unwrap();
        let id = store_file::load(&path).unwrap().snapshot()[0].id;
        cmd_feedback(&settings, &path, id.0, false).unwrap();

        let pattern = store_file::load(&path).unwrap().get(id).unwrap();
        assert_eq!(pattern.confidence, 0.6);
        assert_eq!(pattern.category_id, Some(CategoryId(2)));
        assert!(cmd_feedback(&settings, &path, 999, true).is_err());
    }
}
