//! JSON file persistence for the pattern store.

use ledgerline_core::Pattern;
use ledgerline_import::{PatternError, PatternStore};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreFileError {
    #[error("Pattern store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Pattern store {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Load the store at `path`; a missing file is an empty store.
pub fn load(path: &Path) -> Result<PatternStore, StoreFileError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PatternStore::new()),
        Err(source) => {
            return Err(StoreFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let patterns: Vec<Pattern> =
        serde_json::from_slice(&bytes).map_err(|source| StoreFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(PatternStore::from_patterns(patterns)?)
}

/// Write a snapshot of `store` to `path`, replacing it atomically.
pub fn save(path: &Path, store: &PatternStore) -> Result<(), StoreFileError> {
    let io_err = |source| StoreFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(&store.snapshot()).map_err(|source| StoreFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    tracing::debug!(path = %path.display(), patterns = store.len(), "pattern store saved");
    Ok(())
}
