//! Error taxonomy shared by every store in the crate.
//!
//! Callers (the HTTP layer, the CLI) should branch on [`StoreError::kind`]
//! rather than on individual variants; the variants exist to carry the
//! attempted path or offending id into the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used to map failures onto responses / exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    WriteConflict,
    StorageUnavailable,
    Corrupt,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger file not found: {}", path.display())]
    LedgerMissing { path: PathBuf },

    #[error("record {id} not found in {}", path.display())]
    RowNotFound { id: String, path: PathBuf },

    #[error("data directory does not exist: {}", path.display())]
    BaseDirMissing { path: PathBuf },

    #[error(
        "file \"{file_name}\" is open in a spreadsheet editor or used by another program; close it and try again"
    )]
    WriteConflict {
        file_name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    StorageUnavailable {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("establishment identifier {id:?} does not map to a usable folder name")]
    InvalidEstablishment { id: String },

    #[error("invalid month {value:?}, expected YYYY-MM")]
    InvalidMonth { value: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::LedgerMissing { .. }
            | StoreError::RowNotFound { .. }
            | StoreError::BaseDirMissing { .. } => ErrorKind::NotFound,
            StoreError::WriteConflict { .. } => ErrorKind::WriteConflict,
            StoreError::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
            StoreError::Corrupt { .. } => ErrorKind::Corrupt,
            StoreError::InvalidEstablishment { .. } | StoreError::InvalidMonth { .. } => {
                ErrorKind::InvalidInput
            }
        }
    }

    pub(crate) fn unavailable(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::StorageUnavailable {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// True when the OS reports the target as held open / locked by someone else.
///
/// Windows: ERROR_SHARING_VIOLATION (32), ERROR_LOCK_VIOLATION (33).
/// Unix: EBUSY (16), ETXTBSY (26).
pub(crate) fn is_lock_error(err: &io::Error) -> bool {
    match err.raw_os_error() {
        #[cfg(windows)]
        Some(32) | Some(33) => true,
        #[cfg(unix)]
        Some(16) | Some(26) => true,
        _ => false,
    }
}
