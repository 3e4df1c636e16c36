//! Row-level storage over one establishment-month workbook.
//!
//! Every mutation loads the whole sheet, transforms the row list in memory and
//! rewrites the whole sheet. Mutations always target the current month;
//! historical months are read-only through [`LedgerStore::read`].
//!
//! There is no lock: two writers racing on the same file means the last write
//! wins. When the OS refuses the write because the workbook is held open by
//! another program (typically a spreadsheet editor) the caller gets
//! [`StoreError::WriteConflict`] instead of a generic I/O failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::errors::{is_lock_error, Result, StoreError};
use crate::paths::StoragePaths;
use crate::rows::{LedgerRow, RowPatch, COLUMNS, SHEET_NAME};
use crate::xlsx::{self, Cell, Sheet};

#[derive(Debug, Clone)]
pub struct LedgerStore {
    paths: StoragePaths,
}

impl LedgerStore {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Append `rows` after the rows already stored for this month, creating
    /// the workbook on first use. Returns the path written.
    pub fn append(&self, establishment: &str, rows: &[LedgerRow]) -> Result<PathBuf> {
        let path = self.paths.ledger_path(establishment, None)?;
        let mut all = match load_rows(&path)? {
            Some(existing) => existing,
            None => {
                debug!(path = %path.display(), "creating new ledger workbook");
                Vec::new()
            }
        };
        let previous = all.len();
        all.extend_from_slice(rows);
        write_rows(&path, &all)?;

        info!(
            establishment = %establishment,
            appended = rows.len(),
            total = all.len(),
            previous,
            "ledger rows appended"
        );
        Ok(path)
    }

    /// Rows for the month containing `month` (today when `None`), in the order
    /// they were appended. A month with no workbook yields no rows.
    pub fn read(&self, establishment: &str, month: Option<NaiveDate>) -> Result<Vec<LedgerRow>> {
        let path = self.paths.ledger_path(establishment, month)?;
        let rows = load_rows(&path)?.unwrap_or_default();
        debug!(path = %path.display(), rows = rows.len(), "ledger read");
        Ok(rows)
    }

    /// Merge `patch` into the current-month row whose id is `id`.
    pub fn patch(&self, establishment: &str, id: &str, patch: &RowPatch) -> Result<()> {
        let path = self.paths.ledger_path(establishment, None)?;
        let mut rows = load_rows(&path)?.ok_or_else(|| StoreError::LedgerMissing {
            path: path.clone(),
        })?;

        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::RowNotFound {
                id: id.to_string(),
                path: path.clone(),
            })?;
        row.apply(patch);

        write_rows(&path, &rows)?;
        info!(establishment = %establishment, id, "ledger row updated");
        Ok(())
    }

    /// Apply `patch` to each id in turn. Not atomic: the first failure stops
    /// the batch and ids before it stay updated.
    pub fn patch_many(&self, establishment: &str, ids: &[String], patch: &RowPatch) -> Result<()> {
        for (done, id) in ids.iter().enumerate() {
            if let Err(e) = self.patch(establishment, id, patch) {
                warn!(
                    establishment = %establishment,
                    id = %id,
                    done,
                    remaining = ids.len() - done,
                    error = %e,
                    "batch update stopped"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove the current-month row whose id is `id`.
    pub fn delete(&self, establishment: &str, id: &str) -> Result<()> {
        let path = self.paths.ledger_path(establishment, None)?;
        let rows = load_rows(&path)?.ok_or_else(|| StoreError::LedgerMissing {
            path: path.clone(),
        })?;

        let before = rows.len();
        let remaining: Vec<LedgerRow> = rows.into_iter().filter(|row| row.id != id).collect();
        if remaining.len() == before {
            return Err(StoreError::RowNotFound {
                id: id.to_string(),
                path,
            });
        }

        write_rows(&path, &remaining)?;
        info!(establishment = %establishment, id, remaining = remaining.len(), "ledger row deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sheet <-> rows
// ---------------------------------------------------------------------------

/// `Ok(None)` when the workbook does not exist.
fn load_rows(path: &Path) -> Result<Option<Vec<LedgerRow>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::unavailable(
                format!("failed to read {}", path.display()),
                e,
            ))
        }
    };
    let sheet = xlsx::read_first_sheet(&bytes).map_err(|e| {
        warn!(path = %path.display(), error = %e, "ledger workbook could not be decoded");
        StoreError::corrupt(path, e)
    })?;
    Ok(Some(sheet_to_rows(&sheet)))
}

/// Map records by header name. Unknown columns are dropped and missing ones
/// read as empty, so the next rewrite restores the canonical column order.
fn sheet_to_rows(sheet: &Sheet) -> Vec<LedgerRow> {
    let Some((header, records)) = sheet.rows.split_first() else {
        return Vec::new();
    };
    let names: Vec<String> = header
        .iter()
        .map(|cell| cell.clone().into_text().trim().to_string())
        .collect();
    let columns = COLUMNS.map(|column| names.iter().position(|name| name == column));
    records
        .iter()
        .map(|cells| LedgerRow::from_cells(&columns, cells))
        .collect()
}

fn rows_to_sheet(rows: &[LedgerRow]) -> Sheet {
    let mut data = Vec::with_capacity(rows.len() + 1);
    data.push(COLUMNS.iter().map(|name| Cell::text(name)).collect());
    data.extend(rows.iter().map(LedgerRow::to_cells));
    Sheet {
        name: SHEET_NAME.to_string(),
        rows: data,
    }
}

/// Encode in memory first so a failed encode never truncates the file, then
/// overwrite in place.
fn write_rows(path: &Path, rows: &[LedgerRow]) -> Result<()> {
    let bytes = xlsx::write_workbook(&rows_to_sheet(rows)).map_err(|e| {
        StoreError::unavailable(
            format!("failed to encode workbook for {}", path.display()),
            io::Error::new(io::ErrorKind::Other, e),
        )
    })?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            StoreError::unavailable(format!("failed to create {}", dir.display()), e)
        })?;
    }

    fs::write(path, bytes).map_err(|e| {
        if is_lock_error(&e) {
            warn!(path = %path.display(), error = %e, "ledger workbook is locked by another program");
            StoreError::WriteConflict {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.to_path_buf(),
                source: e,
            }
        } else {
            warn!(path = %path.display(), error = %e, "failed to write ledger workbook");
            StoreError::unavailable(format!("failed to write {}", path.display()), e)
        }
    })
}
