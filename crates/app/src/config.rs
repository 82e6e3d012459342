use ledgerline_import::{AssemblerConfig, LearnerConfig, MatcherConfig};
use ledgerline_ocr::SelectorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Everything tunable, one TOML table per component. Every table and key is
/// optional.
///
/// ```toml
/// store_path = "/var/lib/ledgerline/patterns.json"
///
/// [selector]
/// language = "eng"
/// garbled_threshold = 0.2
///
/// [assembler]
/// layout = "fees_amount_balance"
///
/// [learner]
/// stoplist = ["PURCHASE", "LOCAL", "DEBIT", "CREDIT"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pattern store file; the platform data directory when unset.
    pub store_path: Option<PathBuf>,
    /// Tesseract `tessdata` directory, for builds with the `tesseract` feature.
    pub tessdata_path: Option<String>,
    pub selector: SelectorConfig,
    pub assembler: AssemblerConfig,
    pub learner: LearnerConfig,
    pub matcher: MatcherConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.selector.garbled_threshold) {
            return Err(ConfigError::Invalid(format!(
                "selector.garbled_threshold {} is outside [0, 1]",
                self.selector.garbled_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.matcher.activation_floor) {
            return Err(ConfigError::Invalid(format!(
                "matcher.activation_floor {} is outside [0, 1]",
                self.matcher.activation_floor
            )));
        }
        if self.assembler.start_date_tokens == 0 {
            return Err(ConfigError::Invalid(
                "assembler.start_date_tokens must be at least 1".into(),
            ));
        }
        self.learner
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_import::ColumnLayout;

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.selector.language, "eng");
        assert_eq!(settings.matcher.activation_floor, 0.3);
        assert_eq!(settings.learner.initial_confidence, 0.7);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            store_path = "/tmp/patterns.json"

            [selector]
            language = "afr"

            [assembler]
            layout = "balance_amount_fees"
            noise_phrases = ["opening balance"]

            [learner]
            stoplist = ["EFT"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.store_path.as_deref(), Some(Path::new("/tmp/patterns.json")));
        assert_eq!(settings.selector.language, "afr");
        assert_eq!(settings.selector.garbled_threshold, 0.2);
        assert_eq!(settings.assembler.layout, ColumnLayout::BalanceAmountFees);
        assert_eq!(settings.assembler.start_date_tokens, 2);
        assert_eq!(settings.learner.stoplist, vec!["EFT".to_string()]);
        assert_eq!(settings.learner.min_reference_len, 6);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            Settings::from_toml("[selector]\ngarbled_threshold = 2.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_toml("[learner]\nstep = -0.1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_toml("[assembler]\nstart_date_tokens = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_toml("[assembler]\nlayout = \"sideways\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledgerline.toml");
        std::fs::write(&path, "[matcher]\nactivation_floor = 0.5\n").unwrap();
        assert_eq!(Settings::load(&path).unwrap().matcher.activation_floor, 0.5);
        assert!(matches!(
            Settings::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
