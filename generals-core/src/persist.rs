//! Evaluator files: parameters plus a metadata sidecar
//!
//! `save(path)` writes the evaluator parameters as JSON at `path` and the
//! metadata at `path.with_extension("meta.json")`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::board::{PlayerId, MAX_SIDE};
use crate::error::PersistError;

/// What a saved evaluator needs to encode views consistently
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorMeta {
    pub player: PlayerId,
    pub max_width: usize,
    pub max_height: usize,
}

impl EvaluatorMeta {
    pub fn new(player: PlayerId, max_width: usize, max_height: usize) -> Self {
        Self { player, max_width, max_height }
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.max_width == 0
            || self.max_height == 0
            || self.max_width > MAX_SIDE
            || self.max_height > MAX_SIDE
        {
            return Err(PersistError::InvalidMetadata(format!(
                "maximum size {}x{} out of range",
                self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

/// Sidecar path for an evaluator file
pub fn meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Write evaluator parameters and metadata
pub fn save<E: Serialize>(
    evaluator: &E,
    meta: &EvaluatorMeta,
    path: &Path,
) -> Result<(), PersistError> {
    meta.validate()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| PersistError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    write_json(path, evaluator)?;
    write_json(&meta_path(path), meta)?;
    tracing::debug!(path = %path.display(), player = %meta.player, "saved evaluator");
    Ok(())
}

/// Read evaluator parameters and metadata
pub fn load<E: DeserializeOwned>(path: &Path) -> Result<(E, EvaluatorMeta), PersistError> {
    let meta: EvaluatorMeta = read_json(&meta_path(path))?;
    meta.validate()?;
    let evaluator = read_json(path)?;
    Ok((evaluator, meta))
}

/// Load an evaluator, falling back to a fresh one with `fallback` metadata
pub fn load_or_fresh<E: DeserializeOwned + Default>(
    path: &Path,
    fallback: EvaluatorMeta,
) -> (E, EvaluatorMeta) {
    match load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to load evaluator, starting fresh"
            );
            (E::default(), fallback)
        }
    }
}

/// Human-readable summary of a saved evaluator
pub fn info(path: &Path) -> Result<String, PersistError> {
    let meta: EvaluatorMeta = read_json(&meta_path(path))?;
    let params: serde_json::Value = read_json(path)?;
    Ok(format!(
        "path: {}\nplayer: {}\nmax size: {}x{}\nparameters: {}",
        path.display(),
        meta.player,
        meta.max_width,
        meta.max_height,
        params
    ))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let content = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })
}
