//! Base data directory resolution.
//!
//! The operator can point the store at any folder through `CUSTOM_DATA_PATH`
//! (or the CLI's `--data-dir`). A blank override is the same as no override
//! everywhere in the crate; the fallback is `./data` under the working
//! directory.
//!
//! A base path chosen by the operator is persisted as a `CUSTOM_DATA_PATH`
//! line in `.env.local` under the working directory and loaded at startup.
//! Variables already present in the process environment win over the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, StoreError};
use crate::paths::StoragePaths;

pub const DATA_PATH_ENV: &str = "CUSTOM_DATA_PATH";
pub const DEFAULT_DATA_DIR: &str = "data";

pub const ENV_FILE_NAME: &str = ".env.local";

const PROBE_FILE_NAME: &str = ".test_write";

/// Trim the raw override and drop one pair of surrounding quotes, as left
/// behind by some `.env` writers. Returns `None` for blank values.
pub fn clean_base_override(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = strip_quotes(trimmed).trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && matches!(bytes[0], b'"' | b'\'')
        && matches!(bytes[bytes.len() - 1], b'"' | b'\'')
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Absolute base directory for an already-cleaned override.
pub fn resolve_base_dir(cleaned: Option<&str>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match cleaned {
        Some(custom) => {
            let path = PathBuf::from(custom);
            if path.is_absolute() {
                path
            } else {
                cwd.join(path)
            }
        }
        None => cwd.join(DEFAULT_DATA_DIR),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub base_dir: PathBuf,
    /// Whether `base_dir` came from an explicit override.
    pub custom: bool,
}

impl StoreSettings {
    /// Read `CUSTOM_DATA_PATH` once from the process environment.
    pub fn from_env() -> Self {
        let raw = std::env::var(DATA_PATH_ENV).unwrap_or_default();
        Self::from_override(Some(&raw))
    }

    /// Build settings from an optional raw override (flag or env value).
    pub fn from_override(raw: Option<&str>) -> Self {
        let cleaned = raw.and_then(clean_base_override);
        let base_dir = resolve_base_dir(cleaned.as_deref());
        Self {
            custom: cleaned.is_some(),
            base_dir,
        }
    }

    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            custom: true,
        }
    }

    pub fn paths(&self) -> StoragePaths {
        StoragePaths::new(&self.base_dir)
    }
}

/// Check that `dir` exists (creating it if needed) and accepts new files.
pub fn probe_writable(dir: &Path) -> Result<()> {
    let context = || {
        format!(
            "the folder {} is not valid or is not writable",
            dir.display()
        )
    };
    fs::create_dir_all(dir).map_err(|e| {
        warn!(dir = %dir.display(), error = %e, "base directory probe: create failed");
        StoreError::unavailable(context(), e)
    })?;

    let probe = dir.join(PROBE_FILE_NAME);
    fs::write(&probe, b"test").map_err(|e| {
        warn!(dir = %dir.display(), error = %e, "base directory probe: write failed");
        StoreError::unavailable(context(), e)
    })?;
    fs::remove_file(&probe).map_err(|e| StoreError::unavailable(context(), e))?;

    info!(dir = %dir.display(), "base directory is writable");
    Ok(())
}

// ---------------------------------------------------------------------------
// .env.local
// ---------------------------------------------------------------------------

/// Load `<dir>/.env.local` into the process environment. `Ok(None)` when the
/// file does not exist; a file that cannot be parsed is `Corrupt`.
pub fn load_env_file(dir: &Path) -> Result<Option<PathBuf>> {
    let path = dir.join(ENV_FILE_NAME);
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(StoreError::corrupt(&path, e)),
    }
}

/// Write `base` as the `CUSTOM_DATA_PATH` entry of `<dir>/.env.local`,
/// replacing any previous entry and keeping every other line. A blank `base`
/// removes the entry.
pub fn save_base_override(dir: &Path, base: &str) -> Result<PathBuf> {
    let path = dir.join(ENV_FILE_NAME);
    let existing = match fs::read_to_string(&path) {
        Ok(body) => body,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(StoreError::unavailable(
                format!("failed to read {}", path.display()),
                e,
            ))
        }
    };

    let entry = clean_base_override(base).map(|value| env_entry(&value));
    let prefix = format!("{DATA_PATH_ENV}=");
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in existing.lines() {
        if line.trim_start().starts_with(&prefix) {
            if !replaced {
                lines.extend(entry.clone());
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }
    if !replaced {
        lines.extend(entry);
    }

    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(&path, body).map_err(|e| {
        warn!(path = %path.display(), error = %e, "failed to save base directory");
        StoreError::unavailable(format!("failed to write {}", path.display()), e)
    })?;
    debug!(path = %path.display(), "base directory saved");
    Ok(path)
}

/// Single quotes keep Windows backslashes literal; values holding a single
/// quote fall back to an escaped double-quoted string.
fn env_entry(value: &str) -> String {
    if value.contains('\'') {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("{DATA_PATH_ENV}=\"{escaped}\"")
    } else {
        format!("{DATA_PATH_ENV}='{value}'")
    }
}
