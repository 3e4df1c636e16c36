//! On-disk layout for establishments.
//!
//! ```text
//! <base>/<slug>/config.json
//! <base>/<slug>/<yyyy>/<NN-MonthName>/vendas.xlsx
//! ```
//!
//! Directories are created lazily the first time a path is asked for, so a
//! brand-new establishment needs no provisioning step.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, error};

use crate::errors::{Result, StoreError};

pub const LEDGER_FILE_NAME: &str = "vendas.xlsx";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Month folder names, 1-indexed by calendar month.
const MONTH_FOLDERS: [&str; 12] = [
    "01-Janeiro",
    "02-Fevereiro",
    "03-Marco",
    "04-Abril",
    "05-Maio",
    "06-Junho",
    "07-Julho",
    "08-Agosto",
    "09-Setembro",
    "10-Outubro",
    "11-Novembro",
    "12-Dezembro",
];

/// Filesystem-safe slug: anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Folder name for a calendar month (1..=12). Out-of-range months clamp.
pub fn month_folder(month: u32) -> &'static str {
    let idx = month.clamp(1, 12) as usize - 1;
    MONTH_FOLDERS[idx]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    base: PathBuf,
}

impl StoragePaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Slug for `establishment`, rejecting names that would collapse onto or
    /// escape the base directory.
    pub fn establishment_slug(&self, establishment: &str) -> Result<String> {
        let slug = slugify(establishment);
        if slug.is_empty() || slug.chars().all(|c| c == '.') {
            return Err(StoreError::InvalidEstablishment {
                id: establishment.to_string(),
            });
        }
        Ok(slug)
    }

    /// `base/<slug>` without touching the filesystem.
    pub fn establishment_dir(&self, establishment: &str) -> Result<PathBuf> {
        Ok(self.base.join(self.establishment_slug(establishment)?))
    }

    /// Ledger workbook for the month containing `date` (today when `None`).
    /// Creates every missing directory along the way.
    pub fn ledger_path(&self, establishment: &str, date: Option<NaiveDate>) -> Result<PathBuf> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let month_dir = self
            .establishment_dir(establishment)?
            .join(date.year().to_string())
            .join(month_folder(date.month()));
        self.ensure_dir(&month_dir)?;
        Ok(month_dir.join(LEDGER_FILE_NAME))
    }

    /// `base/<slug>/config.json`, creating `base/<slug>` if needed.
    pub fn config_path(&self, establishment: &str) -> Result<PathBuf> {
        let dir = self.establishment_dir(establishment)?;
        self.ensure_dir(&dir)?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if dir.is_dir() {
            return Ok(());
        }
        if !self.base.exists() {
            debug!(base = %self.base.display(), "creating base data directory");
        }
        fs::create_dir_all(dir).map_err(|e| {
            error!(dir = %dir.display(), error = %e, "failed to create directories");
            StoreError::unavailable(
                format!(
                    "could not create folders under {}; check permissions",
                    self.base.display()
                ),
                e,
            )
        })
    }
}
